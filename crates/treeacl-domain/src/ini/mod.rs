//! Flat-file ACL.
//!
//! Each ini section names an ARO and lists the ACOs it may (`allow`) or may
//! not (`deny`) access, plus the `groups` whose lists it falls back to:
//!
//! ```text
//! [alice]
//! groups = admins
//! deny = secret
//!
//! [admins]
//! allow = secret, reports
//! ```
//!
//! There is no tree walk and no tri-state value; the requested action is
//! ignored. The parsed file is held as an immutable snapshot that only
//! changes through an explicit [`IniAcl::reload`].

pub mod parser;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::error::{DomainError, DomainResult};

pub use parser::IniDocument;

/// Access lists of one ARO section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AroRules {
    pub allow: Vec<String>,
    pub deny: Vec<String>,
    pub groups: Vec<String>,
}

impl AroRules {
    /// Deny-then-allow decision for one section; `None` when neither list matches.
    fn decide(&self, aco: &str) -> Option<bool> {
        if self.deny.iter().any(|d| d == aco) {
            return Some(false);
        }
        if self.allow.iter().any(|a| a == aco) {
            return Some(true);
        }
        None
    }
}

/// Parsed flat-file ACL: ARO name → rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IniAclConfig {
    rules: HashMap<String, AroRules>,
}

impl IniAclConfig {
    /// Builds the rule table from a parsed document.
    pub fn from_document(document: &IniDocument) -> Self {
        let rules = document
            .sections()
            .map(|(name, entries)| {
                let list = |key: &str| {
                    entries
                        .iter()
                        .find(|(k, _)| k.eq_ignore_ascii_case(key))
                        .map(|(_, v)| split_list(v))
                        .unwrap_or_default()
                };
                let rules = AroRules {
                    allow: list("allow"),
                    deny: list("deny"),
                    groups: list("groups"),
                };
                (name.to_string(), rules)
            })
            .collect();
        Self { rules }
    }

    /// Parses ini text.
    pub fn parse(input: &str) -> DomainResult<Self> {
        let document = parser::parse(input)?;
        Ok(Self::from_document(&document))
    }

    pub fn rules(&self, aro: &str) -> Option<&AroRules> {
        self.rules.get(aro)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// ARO deny, ARO allow, then each group's deny/allow in listed order.
    pub fn check(&self, aro: &str, aco: &str) -> bool {
        let Some(rules) = self.rules.get(aro) else {
            return false;
        };
        if let Some(decision) = rules.decide(aco) {
            return decision;
        }

        // Groups are followed one level deep only
        for group in &rules.groups {
            if let Some(decision) = self.rules.get(group).and_then(|g| g.decide(aco)) {
                return decision;
            }
        }
        false
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Flat-file ACL backed by an ini file.
#[derive(Debug)]
pub struct IniAcl {
    source: Option<PathBuf>,
    config: RwLock<Arc<IniAclConfig>>,
}

impl IniAcl {
    /// Reads and parses `path` once.
    pub fn load(path: impl AsRef<Path>) -> DomainResult<Self> {
        let path = path.as_ref();
        let config = Self::read_config(path)?;
        info!(path = %path.display(), aros = config.len(), "loaded flat-file ACL");
        Ok(Self {
            source: Some(path.to_path_buf()),
            config: RwLock::new(Arc::new(config)),
        })
    }

    /// Builds an ACL from in-memory ini text. Such an ACL cannot be reloaded.
    pub fn from_ini_str(input: &str) -> DomainResult<Self> {
        Ok(Self::from_config(IniAclConfig::parse(input)?))
    }

    pub fn from_config(config: IniAclConfig) -> Self {
        Self {
            source: None,
            config: RwLock::new(Arc::new(config)),
        }
    }

    fn read_config(path: &Path) -> DomainResult<IniAclConfig> {
        let text = std::fs::read_to_string(path).map_err(|source| DomainError::Io {
            path: path.display().to_string(),
            source,
        })?;
        IniAclConfig::parse(&text)
    }

    /// Current snapshot of the rules.
    pub fn snapshot(&self) -> Arc<IniAclConfig> {
        Arc::clone(&self.config.read())
    }

    /// Re-reads the source file and swaps in the new rules.
    ///
    /// On failure the previous rules stay in effect.
    pub fn reload(&self) -> DomainResult<()> {
        let Some(path) = &self.source else {
            return Err(DomainError::Configuration {
                message: "flat-file ACL was not loaded from a file".to_string(),
            });
        };
        let config = Self::read_config(path)?;
        info!(path = %path.display(), aros = config.len(), "reloaded flat-file ACL");
        *self.config.write() = Arc::new(config);
        Ok(())
    }

    /// Checks `aro` against `aco`. The action is accepted for interface
    /// parity and ignored.
    pub fn check(&self, aro: &str, aco: &str, _action: &str) -> bool {
        let (aro, aco) = (aro.trim(), aco.trim());
        if aro.is_empty() || aco.is_empty() {
            return false;
        }
        let allowed = self.snapshot().check(aro, aco);
        debug!(aro, aco, allowed, "flat-file acl check");
        allowed
    }

    /// Static files cannot be changed at runtime; always `false`.
    pub fn set_permission(&self, aro: &str, aco: &str) -> bool {
        warn!(aro, aco, "flat-file ACL is read-only; permission change ignored");
        false
    }
}
