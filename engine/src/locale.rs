//! Locale reconciliation between two systems.
//!
//! The two sides of a transfer may disagree on their default locale and on
//! which locales exist at all. Remote writes always hang localized entities
//! off a parent in the remote default locale, so before anything is sent
//! the batch is reshaped: the variant in the remote default locale becomes
//! the primary entity, the former primary is demoted into its localization
//! list, and locales the remote does not know are filtered out. Entities
//! with no variant in the remote default locale cannot be represented and
//! are dropped.

use crate::entity::{Entity, RelatedEntity, RemoteEntity};
use crate::{Locale, RemoteId};

/// Default locales and locale availability of both sides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalesInfo {
    /// Default locale of the local system
    pub local_default: Locale,
    /// Default locale of the remote system
    pub remote_default: Locale,
    /// Locale codes the remote system knows, empty when unknown
    pub available_remote: Vec<Locale>,
}

impl LocalesInfo {
    pub fn new(
        local_default: impl Into<Locale>,
        remote_default: impl Into<Locale>,
        available_remote: Vec<Locale>,
    ) -> Self {
        Self {
            local_default: local_default.into(),
            remote_default: remote_default.into(),
            available_remote,
        }
    }

    /// Whether both systems agree on the default locale.
    pub fn same_defaults(&self) -> bool {
        self.local_default == self.remote_default
    }

    /// Whether a locale can be written remotely. Non-localized values and
    /// an unknown remote locale list always pass.
    pub fn supports(&self, locale: Option<&str>) -> bool {
        match locale {
            None => true,
            Some(code) => {
                self.available_remote.is_empty()
                    || self.available_remote.iter().any(|known| known == code)
            }
        }
    }

    /// Whether a locale is the remote default. Non-localized values count
    /// as default.
    pub fn is_remote_default(&self, locale: Option<&str>) -> bool {
        match locale {
            None => true,
            Some(code) => code == self.remote_default,
        }
    }
}

/// Reshape a batch so every entity is keyed by the remote default locale.
///
/// With agreeing defaults only localization lists are filtered down to the
/// remote's available locales. With differing defaults each entity is
/// rebuilt around its variant in the remote default locale, itself
/// included; entities without such a variant are dropped. Entities
/// without any locale pass through untouched either way.
pub fn reconcile_entities(entities: Vec<Entity>, info: &LocalesInfo) -> Vec<Entity> {
    if info.same_defaults() {
        if info.available_remote.is_empty() {
            return entities;
        }

        return entities
            .into_iter()
            .map(|mut entity| {
                if entity.localizations.is_empty() || entity.locale.is_none() {
                    return entity;
                }
                entity
                    .localizations
                    .retain(|loc| loc.locale.is_some() && info.supports(loc.locale.as_deref()));
                entity
            })
            .collect();
    }

    let mut reconciled = Vec::new();
    for mut entity in entities {
        if entity.locale.is_none() {
            reconciled.push(entity);
            continue;
        }

        // An entity already in the remote default locale is its own primary.
        if entity.locale.as_deref() == Some(info.remote_default.as_str()) {
            if !info.available_remote.is_empty() {
                entity
                    .localizations
                    .retain(|loc| loc.locale.is_some() && info.supports(loc.locale.as_deref()));
            }
            reconciled.push(entity);
            continue;
        }

        let Entity {
            id,
            locale,
            mut localizations,
            fields,
        } = entity;

        let Some(default_index) = localizations
            .iter()
            .position(|loc| loc.locale.as_deref() == Some(info.remote_default.as_str()))
        else {
            continue;
        };

        let mut promoted = localizations.remove(default_index);
        let mut others = localizations;
        others.push(Entity {
            id,
            locale,
            localizations: Vec::new(),
            fields,
        });

        promoted.localizations = if info.available_remote.is_empty() {
            others
        } else {
            others
                .into_iter()
                .filter(|loc| loc.locale.is_some() && info.supports(loc.locale.as_deref()))
                .collect()
        };

        reconciled.push(promoted);
    }

    reconciled
}

/// Remote localization siblings that correspond to local ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectedLocalizations {
    /// Remote ids of siblings matched by locale and main field
    pub sibling_ids: Vec<RemoteId>,
    /// The matched siblings' variant in the requested locale: a matched
    /// sibling itself in that locale, or an entry of one's localization
    /// graph
    pub main_locale_parent: Option<RemoteEntity>,
}

/// Match remote localization siblings against the local ones by locale and
/// main-field value. A matched sibling in `main_locale` itself, or the
/// first match whose own localization graph contains an entry in
/// `main_locale`, also yields that entry.
pub fn connected_localizations(
    remote_siblings: &[RemoteEntity],
    local_siblings: &[RelatedEntity],
    main_field: &str,
    main_locale: Option<&str>,
) -> ConnectedLocalizations {
    let mut connected = ConnectedLocalizations::default();

    for remote in remote_siblings {
        let matched = local_siblings.iter().any(|local| {
            local.locale.as_deref() == remote.locale()
                && local.attributes.get(main_field) == remote.attributes.get(main_field)
        });
        if !matched {
            continue;
        }

        connected.sibling_ids.push(remote.id);

        if connected.main_locale_parent.is_none() {
            connected.main_locale_parent = if remote.locale() == main_locale {
                Some(remote.clone())
            } else {
                remote
                    .localizations()
                    .into_iter()
                    .find(|sibling| sibling.locale() == main_locale)
            };
        }
    }

    connected
}
