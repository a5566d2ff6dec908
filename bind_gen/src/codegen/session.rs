//! Rendering session: the memoization table and registration state shared by
//! every renderer call that contributes to one generated module.
//!
//! A session is owned by the caller and handed to renderers as `&mut`, so two
//! renders can never race on it. Starting an independent module means calling
//! [`Session::reset`] or building a new session.

use super::config::{OperatorOverride, RenderConfig};
use super::errors::{RenderError, RenderResult};
use super::fragment::{Fragment, FragmentId, FragmentKind};
use crate::model::DataModel;
use indexmap::{IndexMap, IndexSet};
use serde_derive::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;
use tracing::{debug, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeclKind {
    Struct,
    Function,
}

/// Declaration identity plus a fingerprint of everything its text depends on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub kind: DeclKind,
    pub name: String,
    pub fingerprint: String,
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            DeclKind::Struct => "struct",
            DeclKind::Function => "function",
        };
        let short = self.fingerprint.get(..12).unwrap_or(self.fingerprint.as_str());
        write!(f, "{} {}@{}", kind, self.name, short)
    }
}

/* Feeds length-delimited parts so ("ab", "c") and ("a", "bc") differ */
pub(crate) struct FingerprintBuilder {
    hasher: Sha256,
}

impl FingerprintBuilder {
    pub(crate) fn new(header: &Path, header_digest: Option<&str>) -> Self {
        let mut builder = Self {
            hasher: Sha256::new(),
        };
        builder.part(&header.to_string_lossy());
        builder.part(header_digest.unwrap_or(""));
        builder
    }

    pub(crate) fn part(&mut self, value: &str) -> &mut Self {
        self.hasher.update((value.len() as u64).to_le_bytes());
        self.hasher.update(value.as_bytes());
        self
    }

    pub(crate) fn finish(self, kind: DeclKind, name: &str) -> CacheKey {
        let digest = self.hasher.finalize();
        let fingerprint = digest.iter().map(|byte| format!("{:02x}", byte)).collect();
        CacheKey {
            kind,
            name: name.to_string(),
            fingerprint,
        }
    }
}

/// Struct proxy registered by the struct renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProxyType {
    pub native_name: String,
    pub host_name: String,
    pub size: u64,
    pub alignment: u64,
    pub model: DataModel,
}

/// What one declaration rendered to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub fragments: Vec<Fragment>,
    pub includes: Vec<String>,
    pub proxy: Option<ProxyType>,
}

#[derive(Debug, Clone)]
struct StoredFragment {
    owner: CacheKey,
    fragment: Fragment,
}

/// Everything one declaration wants to commit, validated as a unit.
pub(crate) struct PendingRender {
    pub key: CacheKey,
    pub entry: CacheEntry,
    /// Operator declarations may replace an earlier registration.
    pub replaceable: bool,
}

#[derive(Debug, Default)]
pub struct Session {
    config: RenderConfig,
    cache: IndexMap<CacheKey, CacheEntry>,
    fragments: IndexMap<FragmentId, StoredFragment>,
    proxies: IndexMap<String, ProxyType>,
    includes: IndexSet<String>,
}

impl Session {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Drop every cached fragment and registration; the config is kept.
    pub fn reset(&mut self) {
        debug!(
            cached = self.cache.len(),
            fragments = self.fragments.len(),
            "resetting render session"
        );
        self.cache.clear();
        self.fragments.clear();
        self.proxies.clear();
        self.includes.clear();
    }

    pub fn cached(&self, key: &CacheKey) -> Option<&CacheEntry> {
        self.cache.get(key)
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn cache_keys(&self) -> impl Iterator<Item = &CacheKey> {
        self.cache.keys()
    }

    /// True when some rendering of the named declaration is cached.
    pub fn has_rendered(&self, kind: DeclKind, name: &str) -> bool {
        self.cache.keys().any(|key| key.kind == kind && key.name == name)
    }

    pub fn proxy(&self, native_name: &str) -> Option<&ProxyType> {
        self.proxies.get(native_name)
    }

    pub fn proxies(&self) -> impl Iterator<Item = &ProxyType> {
        self.proxies.values()
    }

    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }

    pub fn fragment(&self, kind: FragmentKind, name: &str) -> Option<&Fragment> {
        self.fragments
            .get(&FragmentId {
                kind,
                name: name.to_string(),
            })
            .map(|stored| &stored.fragment)
    }

    /// Committed fragments in emission order.
    pub fn fragments(&self) -> impl Iterator<Item = &Fragment> {
        self.fragments.values().map(|stored| &stored.fragment)
    }

    pub fn includes(&self) -> impl Iterator<Item = &str> {
        self.includes.iter().map(String::as_str)
    }

    /// Validate `pending` against the session, then apply it in one step.
    pub(crate) fn commit(&mut self, pending: PendingRender) -> RenderResult<()> {
        let PendingRender {
            key,
            entry,
            replaceable,
        } = pending;
        let may_replace =
            replaceable && self.config.operator_override == OperatorOverride::LastWins;

        for fragment in &entry.fragments {
            if fragment.kind == FragmentKind::Import {
                continue;
            }
            if let Some(stored) = self.fragments.get(&fragment.id()) {
                if stored.owner != key && !may_replace {
                    return Err(RenderError::NameCollision {
                        name: fragment.name.clone(),
                        existing: stored.owner.name.clone(),
                        incoming: key.name.clone(),
                    });
                }
            }
        }
        if let Some(proxy) = &entry.proxy {
            if let Some(existing) = self.proxies.get(&proxy.native_name) {
                if existing != proxy {
                    return Err(RenderError::NameCollision {
                        name: proxy.native_name.clone(),
                        existing: existing.host_name.clone(),
                        incoming: proxy.host_name.clone(),
                    });
                }
            }
        }

        let mut displaced: Vec<CacheKey> = Vec::new();
        for fragment in &entry.fragments {
            let id = fragment.id();
            match self.fragments.get_mut(&id) {
                Some(_) if fragment.kind == FragmentKind::Import => {}
                Some(stored) => {
                    if stored.owner != key {
                        warn!(
                            name = %fragment.name,
                            previous = %stored.owner,
                            replacement = %key,
                            "operator registration replaced by later declaration"
                        );
                        if !displaced.contains(&stored.owner) {
                            displaced.push(stored.owner.clone());
                        }
                    }
                    stored.owner = key.clone();
                    stored.fragment = fragment.clone();
                }
                None => {
                    trace!(kind = %fragment.kind, name = %fragment.name, bytes = fragment.text.len(), "recording fragment");
                    self.fragments.insert(
                        id,
                        StoredFragment {
                            owner: key.clone(),
                            fragment: fragment.clone(),
                        },
                    );
                }
            }
        }
        /* A displaced declaration re-renders instead of replaying stale text */
        for owner in displaced {
            if self.cache.shift_remove(&owner).is_some() {
                debug!(key = %owner, "dropped cache entry of replaced declaration");
            }
        }
        for header in &entry.includes {
            self.includes.insert(header.clone());
        }
        if let Some(proxy) = &entry.proxy {
            self.proxies.insert(proxy.native_name.clone(), proxy.clone());
        }

        debug!(key = %key, fragments = entry.fragments.len(), "committed declaration");
        self.cache.insert(key, entry);
        Ok(())
    }
}
