//! Namespaces used.

/// Declares a namespace module: a `PREFIX` constant plus one constant per
/// term, each expanding to the full IRI.
macro_rules! namespace {
    ($ns:literal, $($term:ident),+ $(,)?) => {
        /// Base IRI of this namespace.
        pub const PREFIX: &str = $ns;
        $(
            #[allow(non_upper_case_globals)]
            pub const $term: &str = concat!($ns, stringify!($term));
        )+
    };
}

/// Terms of N3's logic vocabulary.
#[allow(missing_docs)]
pub mod log {
    namespace!(
        "http://www.w3.org/2000/10/swap/log#",
        Formula,
        Literal,
        Other,
        collectAllIn,
        conclusion,
        conjunction,
        content,
        dtlit,
        equalTo,
        forAllIn,
        implies,
        impliedBy,
        includes,
        langlit,
        notEqualTo,
        notIncludes,
        outputString,
        parsedAsN3,
        rawType,
        semantics,
        semanticsOrError,
        skolem,
        trace,
        uri
    );
}

/// Terms of N3's math vocabulary.
#[allow(missing_docs)]
pub mod math {
    namespace!(
        "http://www.w3.org/2000/10/swap/math#",
        absoluteValue,
        acos,
        asin,
        atan,
        atan2,
        cos,
        cosh,
        degrees,
        difference,
        equalTo,
        exponentiation,
        greaterThan,
        integerQuotient,
        lessThan,
        negation,
        notEqualTo,
        notGreaterThan,
        notLessThan,
        product,
        quotient,
        remainder,
        rounded,
        sin,
        sinh,
        sum,
        tan,
        tanh
    );
}

/// Terms of N3's string vocabulary.
#[allow(missing_docs)]
pub mod string {
    namespace!(
        "http://www.w3.org/2000/10/swap/string#",
        concatenation,
        contains,
        containsIgnoringCase,
        endsWith,
        equal,
        equalIgnoringCase,
        format,
        greaterThan,
        jsonPointer,
        lessThan,
        matches,
        notEqual,
        notEqualIgnoringCase,
        notGreaterThan,
        notLessThan,
        notMatches,
        replace,
        scrape,
        startsWith
    );
}

/// Terms of N3's list vocabulary.
#[allow(missing_docs)]
pub mod list {
    namespace!(
        "http://www.w3.org/2000/10/swap/list#",
        append,
        first,
        firstRest,
        iterate,
        last,
        length,
        map,
        member,
        memberAt,
        notMember,
        remove,
        rest,
        reverse,
        sort
    );

    #[allow(non_upper_case_globals)]
    /// `list:in`; declared by hand as `in` is a Rust keyword.
    pub const in_: &str = "http://www.w3.org/2000/10/swap/list#in";
}

/// Terms of N3's time vocabulary.
#[allow(missing_docs)]
pub mod time {
    namespace!(
        "http://www.w3.org/2000/10/swap/time#",
        day,
        hour,
        localTime,
        minute,
        month,
        second,
        timeZone,
        year
    );
}

/// Terms of N3's crypto vocabulary.
#[allow(missing_docs)]
pub mod crypto {
    namespace!(
        "http://www.w3.org/2000/10/swap/crypto#",
        md5,
        sha,
        sha256,
        sha512
    );
}

/// Terms of the RDF syntax vocabulary.
#[allow(missing_docs)]
pub mod rdf {
    namespace!(
        "http://www.w3.org/1999/02/22-rdf-syntax-ns#",
        JSON,
        List,
        first,
        langString,
        nil,
        rest
    );

    #[allow(non_upper_case_globals)]
    /// `rdf:type`; declared by hand as `type` is a Rust keyword.
    pub const type_: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
}

/// Terms of the XML Schema datatypes vocabulary.
#[allow(missing_docs)]
pub mod xsd {
    namespace!(
        "http://www.w3.org/2001/XMLSchema#",
        boolean,
        date,
        dateTime,
        decimal,
        double,
        duration,
        float,
        integer,
        string
    );
}

/// Namespace reserved for skolem IRIs minted by `log:skolem`.
pub const SKOLEM_NS: &str = "https://noesis-n3.github.io/.well-known/genid/";
