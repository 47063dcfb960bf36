//! Digest builtins of the `crypto:` vocabulary.
//!
//! Each takes a string subject and yields the lower-case hex digest as a
//! quoted string. `crypto:sha` is SHA-1.

use super::{check_or_bind, text_of, try_opt, Solutions};
use crate::reason::Prover;
use crate::term::Term;
use md5::{Digest, Md5};
use sha1::Sha1;
use sha2::{Sha256, Sha512};

fn digest_with<D: Digest>(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    let text = try_opt!(text_of(s, pv.session));
    let mut hasher = D::new();
    hasher.update(text.as_bytes());
    let hex = hex::encode(hasher.finalize());
    check_or_bind(o, &pv.session.str_literal(&hex), pv.session)
}

/// `s crypto:md5 ?hex`
pub fn md5(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    digest_with::<Md5>(s, o, pv)
}

/// `s crypto:sha ?hex` — SHA-1.
pub fn sha(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    digest_with::<Sha1>(s, o, pv)
}

/// `s crypto:sha256 ?hex`
pub fn sha256(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    digest_with::<Sha256>(s, o, pv)
}

/// `s crypto:sha512 ?hex`
pub fn sha512(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    digest_with::<Sha512>(s, o, pv)
}
