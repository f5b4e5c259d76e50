//! Page references.
//!
//! A reference is anything a user may type to point at a page: an absolute
//! URL, a relative path or a `page.php?key=value` query. It is reduced to a
//! lowercase relative form, an absolute URL to fetch and a canonical key used
//! for equality.

use std::fmt;
use std::hash::{Hash, Hasher};

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{Error, Result};

pub const ORIGIN: &'static str = "https://www.procyclingstats.com";
const HOSTS: [&'static str; 2] = ["www.procyclingstats.com", "procyclingstats.com"];

/// Query values meaning "filter not set"
const UNSET_VALUES: [&'static str; 6] = ["", "0", "equal", "smallerorequal", "largerorequal", "contains"];
/// Keys whose sentinel differs from the shared list
const UNSET_OVERRIDES: [(&'static str, &'static str); 2] = [("filter", "filter"), ("offset", "0")];

// 1: rider id, 2: results sub page
const REGEX_RIDER_RESULTS: &'static str = r#"^rider/([^/]+)/results(?:/(.*))?$"#;

lazy_static! {
    static ref RE_RIDER_RESULTS: Regex = Regex::new(REGEX_RIDER_RESULTS).unwrap();
}

#[derive(Debug, Clone)]
pub struct Reference {
    relative: String,
    absolute: String,
    canonical: String,
}

impl Reference {
    pub fn parse(input: &str) -> Result<Self> {
        let mut text = input.trim().to_lowercase();
        if let Some(idx) = text.find('#') {
            text.truncate(idx);
        }

        for scheme in ["https://", "http://"] {
            if let Some(rest) = text.strip_prefix(scheme) {
                let (host, path) = rest.split_once('/').unwrap_or((rest, ""));
                if !HOSTS.contains(&host) {
                    return Err(Error::value(format!("{:?} is not a procyclingstats.com URL", input)));
                }
                text = path.to_string();
                break;
            }
        }

        let (path, query) = match text.split_once('?') {
            Some((p, q)) => (p.to_string(), Some(q.to_string())),
            None => (text.clone(), None),
        };
        let path = compact_path(&path);
        if path.is_empty() {
            return Err(Error::value(format!("{:?} doesn't point at a page", input)));
        }

        let query = query.filter(|q| !q.is_empty());
        let relative = match &query {
            Some(q) => format!("{}?{}", path, q),
            None => path.clone(),
        };
        let absolute = format!("{}/{}", ORIGIN, relative);
        let canonical = canonicalize(&path, query.as_deref());

        Ok(Reference {
            relative,
            absolute,
            canonical,
        })
    }

    /// Lowercase relative form, path plus the query as given
    pub fn relative(&self) -> &str {
        &self.relative
    }

    pub fn absolute(&self) -> &str {
        &self.absolute
    }

    /// Equivalence key: two references are the same page iff their keys match
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    /// Canonical path without the query
    pub fn path(&self) -> &str {
        self.canonical.split('?').next().unwrap_or("")
    }

    pub fn segments(&self) -> Vec<&str> {
        self.path().split('/').collect()
    }

    /// Canonical query parameters, unset ones already removed
    pub fn query(&self) -> Vec<(&str, &str)> {
        match self.canonical.split_once('?') {
            Some((_, q)) => q.split('&').filter_map(|p| p.split_once('=')).collect(),
            None => Vec::new(),
        }
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query().into_iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

impl PartialEq for Reference {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for Reference {}

impl Hash for Reference {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.absolute)
    }
}

fn compact_path(path: &str) -> String {
    path.split('/')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

fn is_unset(key: &str, value: &str) -> bool {
    if let Some((_, sentinel)) = UNSET_OVERRIDES.iter().find(|(k, _)| *k == key) {
        return value == *sentinel || value.is_empty();
    }
    UNSET_VALUES.contains(&value)
}

fn canonicalize(path: &str, query: Option<&str>) -> String {
    let path = path.strip_suffix(".php").unwrap_or(path);
    let path = canonical_rider_results(path).unwrap_or_else(|| path.to_string());

    let mut params: Vec<(String, String)> = query
        .unwrap_or("")
        .split('&')
        .filter(|p| !p.is_empty())
        .map(|p| {
            let (k, v) = p.split_once('=').unwrap_or((p, ""));
            let v = urlencoding::decode(v).map(|v| v.into_owned()).unwrap_or_else(|_| v.to_string());
            (k.to_string(), v.trim().to_string())
        })
        .filter(|(k, v)| !is_unset(k, v))
        .collect();
    params.sort();
    params.dedup();

    if params.is_empty() {
        path
    } else {
        let query = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{}", path, query)
    }
}

/// The results pages of a rider have a few spellings; reduce them to
/// `rider/{id}/results` and `rider/{id}/results/final-5k-analysis`
fn canonical_rider_results(path: &str) -> Option<String> {
    let captures = RE_RIDER_RESULTS.captures(path)?;
    let rider = &captures[1];
    let sub = captures.get(2).map(|m| m.as_str()).unwrap_or("");
    let sub = match sub {
        "" | "overview" | "all" | "all-results" => None,
        s if s.starts_with("final-5") => Some("final-5k-analysis"),
        s => Some(s),
    };
    Some(match sub {
        Some(s) => format!("rider/{}/results/{}", rider, s),
        None => format!("rider/{}/results", rider),
    })
}
