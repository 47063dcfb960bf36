//! Synchronous dereferencing of external resources.
//!
//! `log:content`, `log:semantics` and `log:semanticsOrError` block on
//! this module. Results (successes and failures alike) are cached for
//! the run, keyed by the fragment-stripped IRI.

use crate::session::Session;
use log::debug;
use std::rc::Rc;

/// Dereferences an IRI to text.
///
/// `http(s)://` IRIs are fetched over the network with up to 10
/// redirects; statuses outside 200..300 are failures. `file://` IRIs and
/// bare paths are read from disk. With the enforce-https option set,
/// `http://` is rewritten to `https://` before the fetch.
pub fn fetch(session: &Session, iri: &str) -> Result<Rc<str>, String> {
    let mut target = iri.to_string();
    if session.options.enforce_https {
        if let Some(rest) = target.strip_prefix("http://") {
            target = format!("https://{}", rest);
        }
    }
    let key = match target.find('#') {
        Some(pos) => target[..pos].to_string(),
        None => target,
    };
    if let Some(cached) = session.cached_fetch(&key) {
        return cached;
    }
    debug!("dereferencing <{}>", key);
    let result = fetch_uncached(&key);
    session.cache_fetch(key, result.clone());
    result
}

fn fetch_uncached(target: &str) -> Result<Rc<str>, String> {
    if let Some(path) = target.strip_prefix("file://") {
        return read_file(path);
    }
    if target.starts_with("http://") || target.starts_with("https://") {
        return http_get(target);
    }
    read_file(target)
}

fn read_file(path: &str) -> Result<Rc<str>, String> {
    std::fs::read_to_string(path)
        .map(|text| Rc::from(text.as_str()))
        .map_err(|e| format!("cannot read {}: {}", path, e))
}

fn http_get(url: &str) -> Result<Rc<str>, String> {
    let agent = ureq::AgentBuilder::new().redirects(10).build();
    match agent.get(url).call() {
        Ok(response) => response
            .into_string()
            .map(|text| Rc::from(text.as_str()))
            .map_err(|e| format!("cannot read body of {}: {}", url, e)),
        Err(e) => Err(format!("cannot fetch {}: {}", url, e)),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::session::{Options, Session};
    use std::io::Write;

    #[test]
    fn file_fetches_are_cached_with_failures() {
        let session = Session::default();
        let missing = "/nonexistent/noesis-test-input";
        assert!(fetch(&session, missing).is_err());
        // the failure is cached, not retried
        assert!(session.cached_fetch(missing).is_some());
    }

    #[test]
    fn reads_local_files_and_strips_fragments() {
        let session = Session::default();
        let mut path = std::env::temp_dir();
        path.push("noesis-fetch-test.n3");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b":a :b :c .").unwrap();
        let iri = format!("file://{}#frag", path.display());
        let text = fetch(&session, &iri).unwrap();
        assert_eq!(&*text, ":a :b :c .");
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn https_rewrite_applies_before_cache_lookup() {
        let session = Session::new(Options {
            enforce_https: true,
            ..Options::default()
        });
        session.cache_fetch(
            "https://example.org/doc".to_string(),
            Ok(Rc::from("cached")),
        );
        let text = fetch(&session, "http://example.org/doc").unwrap();
        assert_eq!(&*text, "cached");
    }
}
