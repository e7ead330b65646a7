//! Network type mappings between DIS entity type codes and local types
//!
//! Each mapping binds a seven-field entity type code to the local type
//! descriptor the simulation uses to instantiate or describe a player. The
//! trailing subcategory, specific and extra fields may be zero, which acts
//! as a wildcard when matching an incoming code.
//!
//! Matching picks the most specific registered entry (the one with the
//! fewest wildcarded trailing fields); among equally specific entries the
//! first registered wins.

use crate::error::{NetIoError, Result};
use pdu::EntityTypeCode;
use serde::Deserialize;

/// Names the local type a DIS entity type maps to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct TypeDescriptor {
    pub name: String,
}

impl TypeDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// One registered mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ntm {
    pub code: EntityTypeCode,
    pub descriptor: TypeDescriptor,
}

impl Ntm {
    /// Number of wildcarded trailing fields
    fn wildcards(&self) -> u8 {
        [self.code.subcategory, self.code.specific, self.code.extra]
            .iter()
            .filter(|&&field| field == 0)
            .count() as u8
    }

    fn matches(&self, query: &EntityTypeCode) -> bool {
        let trailing = |pattern: u8, value: u8| pattern == 0 || pattern == value;
        self.code.kind == query.kind
            && self.code.domain == query.domain
            && self.code.country == query.country
            && self.code.category == query.category
            && trailing(self.code.subcategory, query.subcategory)
            && trailing(self.code.specific, query.specific)
            && trailing(self.code.extra, query.extra)
    }
}

/// Registry of network type mappings, kept in registration order
#[derive(Debug, Default, Clone)]
pub struct NtmRegistry {
    entries: Vec<Ntm>,
}

impl NtmRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a mapping; an identical code (wildcards included) is a duplicate.
    pub fn register(&mut self, code: EntityTypeCode, descriptor: TypeDescriptor) -> Result<()> {
        if self.entries.iter().any(|ntm| ntm.code == code) {
            return Err(NetIoError::DuplicateMapping(code));
        }
        self.entries.push(Ntm { code, descriptor });
        Ok(())
    }

    /// Most specific mapping for `code`, first registered on ties.
    pub fn lookup(&self, code: &EntityTypeCode) -> Option<&Ntm> {
        let mut best: Option<&Ntm> = None;
        for ntm in self.entries.iter().filter(|ntm| ntm.matches(code)) {
            // Strictly fewer wildcards replaces; equal keeps the earlier entry
            if best.map_or(true, |b| ntm.wildcards() < b.wildcards()) {
                best = Some(ntm);
            }
        }
        best
    }

    /// First registered mapping whose descriptor carries `name`.
    pub fn lookup_by_descriptor(&self, name: &str) -> Option<&Ntm> {
        self.entries.iter().find(|ntm| ntm.descriptor.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Ntm> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(sub: u8, spec: u8, extra: u8) -> EntityTypeCode {
        EntityTypeCode::new(1, 2, 225, 3, sub, spec, extra)
    }

    #[test]
    fn test_specific_beats_wildcard() {
        let mut ntms = NtmRegistry::new();
        ntms.register(code(0, 0, 0), TypeDescriptor::new("generic-fighter"))
            .unwrap();
        ntms.register(code(7, 0, 0), TypeDescriptor::new("F-16"))
            .unwrap();

        assert_eq!(ntms.lookup(&code(7, 0, 0)).unwrap().descriptor.name, "F-16");
        assert_eq!(
            ntms.lookup(&code(0, 0, 0)).unwrap().descriptor.name,
            "generic-fighter"
        );
        assert_eq!(
            ntms.lookup(&code(9, 1, 0)).unwrap().descriptor.name,
            "generic-fighter"
        );
    }

    #[test]
    fn test_registration_order_breaks_ties() {
        let mut ntms = NtmRegistry::new();
        ntms.register(code(7, 0, 0), TypeDescriptor::new("first"))
            .unwrap();
        ntms.register(code(0, 2, 0), TypeDescriptor::new("second"))
            .unwrap();

        // Both leave two fields wildcarded
        let query = code(7, 2, 0);
        for _ in 0..3 {
            assert_eq!(ntms.lookup(&query).unwrap().descriptor.name, "first");
        }
    }

    #[test]
    fn test_head_fields_must_match() {
        let mut ntms = NtmRegistry::new();
        ntms.register(code(0, 0, 0), TypeDescriptor::new("any"))
            .unwrap();
        let mut other_country = code(0, 0, 0);
        other_country.country = 222;
        assert!(ntms.lookup(&other_country).is_none());
    }

    #[test]
    fn test_duplicate_mapping() {
        let mut ntms = NtmRegistry::new();
        ntms.register(code(7, 0, 0), TypeDescriptor::new("a")).unwrap();
        assert!(matches!(
            ntms.register(code(7, 0, 0), TypeDescriptor::new("b")),
            Err(NetIoError::DuplicateMapping(_))
        ));
        assert_eq!(ntms.len(), 1);
    }

    #[test]
    fn test_lookup_by_descriptor() {
        let mut ntms = NtmRegistry::new();
        ntms.register(code(7, 0, 0), TypeDescriptor::new("F-16"))
            .unwrap();
        ntms.register(code(7, 1, 0), TypeDescriptor::new("F-16"))
            .unwrap();
        assert_eq!(ntms.lookup_by_descriptor("F-16").unwrap().code, code(7, 0, 0));
        assert!(ntms.lookup_by_descriptor("Su-27").is_none());
    }
}
