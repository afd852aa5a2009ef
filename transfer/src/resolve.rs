//! Relation resolution against the remote system.
//!
//! Every collection the batch points into is resolved independently and
//! concurrently. Referenced entities already present remotely are matched
//! by main field value; missing ones are created when allowed, parents in
//! the remote default locale first and localized variants hung off them.
//! Each outcome becomes a record mapping the local id to the remote entity
//! that now stands for it.

use courier_engine::{
    connected_localizations, CollectedRelations, CollectionId, ErrorDetail, ErrorItem, LocalId,
    LocalesInfo, NewRelationRecord, RelatedEntity, RemoteEntity, RemoteId, SchemaRegistry,
};
use futures::future::join_all;
use serde_json::{json, Value};

use crate::client::RemoteClient;
use crate::error::Result;
use crate::query::parent_lookup_query;
use crate::remote::{entity_from_envelope, entity_from_flat, fetch_filtered, parse_entity_list};
use crate::service::TransferOptions;
use crate::store::{FindOptions, LocalStore};

/// Outcome of relation resolution.
#[derive(Debug, Default)]
pub struct ResolveOutcome {
    /// One record per referenced entity that exists remotely afterwards
    pub records: Vec<NewRelationRecord>,
    /// Per relation failures
    pub errors: Vec<ErrorItem>,
}

/// Resolve every collected relation against the remote system.
pub async fn resolve_relations(
    registry: &SchemaRegistry,
    store: &dyn LocalStore,
    client: &RemoteClient,
    relations: &CollectedRelations,
    locales: &LocalesInfo,
    options: &TransferOptions,
) -> ResolveOutcome {
    let tasks = relations.iter().map(|(target, values)| async move {
        let content_type = match registry.content_type(target) {
            Ok(content_type) => content_type,
            Err(err) => {
                return (
                    Vec::new(),
                    vec![ErrorItem::new(format!(
                        "Failed to resolve relation {target}: {err}"
                    ))],
                )
            }
        };
        let main_field = match &content_type.main_field {
            Some(main_field) => main_field.as_str(),
            None => {
                return (
                    Vec::new(),
                    vec![ErrorItem::new(format!(
                        "Failed to resolve relation {target}: no main field is configured"
                    ))],
                )
            }
        };

        let resolver = CollectionResolver {
            store,
            client: client.collection(&content_type.plural_name),
            target,
            plural_name: &content_type.plural_name,
            main_field,
            locales,
            create_missing: options.create_missing_relations,
            transfer_locales: options.transfer_locales,
        };
        resolver.run(values).await
    });

    let mut outcome = ResolveOutcome::default();
    for (records, errors) in join_all(tasks).await {
        outcome.records.extend(records);
        outcome.errors.extend(errors);
    }
    outcome
}

/// A parent entity in the remote default locale, together with the remote
/// localization siblings known to hang off it.
#[derive(Debug, Clone)]
struct ParentRecord {
    record: NewRelationRecord,
    localizations: Vec<RemoteEntity>,
}

/// Resolution state for one target collection.
struct CollectionResolver<'a> {
    store: &'a dyn LocalStore,
    client: RemoteClient,
    target: &'a CollectionId,
    plural_name: &'a str,
    main_field: &'a str,
    locales: &'a LocalesInfo,
    create_missing: bool,
    transfer_locales: bool,
}

impl CollectionResolver<'_> {
    async fn run(&self, values: &[RelatedEntity]) -> (Vec<NewRelationRecord>, Vec<ErrorItem>) {
        let filtered: Vec<&RelatedEntity> = values
            .iter()
            .filter(|relation| self.locales.supports(relation.locale.as_deref()))
            .collect();
        let (default_lang, localized): (Vec<&RelatedEntity>, Vec<&RelatedEntity>) =
            filtered.into_iter().partition(|relation| {
                self.locales.is_remote_default(relation.locale.as_deref())
            });

        tracing::debug!(
            "Resolving {} relations into {}: {} in the remote default locale, {} localized",
            values.len(),
            self.target,
            default_lang.len(),
            localized.len()
        );

        let mut errors = Vec::new();
        match self
            .resolve_all(&default_lang, &localized, &mut errors)
            .await
        {
            Ok(records) => (records, errors),
            Err(err) => {
                errors.push(
                    ErrorItem::new(format!("Failed to fetch relation {}: {err}", self.target))
                        .with_details(err.error_details()),
                );
                (Vec::new(), errors)
            }
        }
    }

    async fn resolve_all(
        &self,
        default_lang: &[&RelatedEntity],
        localized: &[&RelatedEntity],
        errors: &mut Vec<ErrorItem>,
    ) -> Result<Vec<NewRelationRecord>> {
        let default_existing = fetch_filtered(
            &self.client,
            &main_field_texts(default_lang.iter().copied(), self.main_field),
            self.main_field,
            None,
        )
        .await;

        let mut records = Vec::new();
        let mut created_parents: Vec<ParentRecord> = Vec::new();

        if self.transfer_locales {
            let remote_localizations = fetch_filtered(
                &self.client,
                &main_field_texts(localized.iter().copied(), self.main_field),
                self.main_field,
                Some("locale=all"),
            )
            .await;

            for locale_relation in localized {
                self.resolve_localized(
                    locale_relation,
                    &default_existing,
                    &remote_localizations,
                    &mut created_parents,
                    &mut records,
                    errors,
                )
                .await?;
            }
        }

        for old_relation in default_lang {
            self.resolve_default(
                old_relation,
                &default_existing,
                &created_parents,
                &mut records,
                errors,
            )
            .await?;
        }

        Ok(records)
    }

    /// Resolve one relation value in a non-default locale. Localized writes
    /// require the parent in the remote default locale to exist first, so
    /// the parent is matched, fetched, or created before the variant itself
    /// is updated or attached.
    async fn resolve_localized(
        &self,
        locale_relation: &RelatedEntity,
        default_existing: &[RemoteEntity],
        remote_localizations: &[RemoteEntity],
        created_parents: &mut Vec<ParentRecord>,
        records: &mut Vec<NewRelationRecord>,
        errors: &mut Vec<ErrorItem>,
    ) -> Result<()> {
        let existing = remote_localizations.iter().find(|remote| {
            remote.attributes.get(self.main_field)
                == locale_relation.attributes.get(self.main_field)
                && remote.locale() == locale_relation.locale.as_deref()
        });
        if let Some(existing) = existing {
            records.push(NewRelationRecord::new(
                locale_relation.id,
                self.target.clone(),
                existing.id,
                existing.attributes.clone(),
            ));
            return Ok(());
        }

        let local_siblings = self.load_local_siblings(locale_relation.id).await?;

        let Some(default_locale_parent) = local_siblings
            .iter()
            .find(|sibling| sibling.locale.as_deref() == Some(self.locales.remote_default.as_str()))
        else {
            errors.push(
                ErrorItem::new("Failed to find default locale relation").with_details(vec![
                    ErrorDetail::new(
                        format!(
                            "Default remote locale {} has no entity for {} ({}) in {}",
                            self.locales.remote_default,
                            locale_relation
                                .main_field_text(self.main_field)
                                .unwrap_or_default(),
                            locale_text(locale_relation),
                            self.plural_name
                        ),
                        "Relation error",
                    ),
                ]),
            );
            return Ok(());
        };

        let parent_main_value = default_locale_parent.attributes.get(self.main_field);
        let created_parent = created_parents
            .iter()
            .find(|parent| parent.record.attributes.get(self.main_field) == parent_main_value)
            .cloned();
        let remote_parent = default_existing
            .iter()
            .find(|remote| remote.attributes.get(self.main_field) == parent_main_value)
            .map(|remote| ParentRecord {
                record: NewRelationRecord::new(
                    default_locale_parent.id,
                    self.target.clone(),
                    remote.id,
                    remote.attributes.clone(),
                ),
                localizations: remote.localizations(),
            });
        let existing_parent = created_parent.or(remote_parent);

        let (locale_parent, parent_errors) = self
            .get_create_locale_parent(
                existing_parent,
                default_locale_parent,
                remote_localizations,
                &local_siblings,
            )
            .await?;
        errors.extend(parent_errors);

        let Some(parent) = locale_parent else {
            errors.push(ErrorItem::new(format!(
                "Failed to create localized relation in locale {} for {}: locale parent was not created.",
                locale_text(locale_relation),
                self.target
            )));
            return Ok(());
        };
        created_parents.push(parent.clone());

        let existing_remote_locale = parent
            .localizations
            .iter()
            .find(|sibling| sibling.locale() == locale_relation.locale.as_deref());

        let (record, op_errors) = match existing_remote_locale {
            Some(sibling) => self.update_entity(locale_relation, sibling.id).await,
            None => {
                let other_locale_ids: Vec<RemoteId> = parent
                    .localizations
                    .iter()
                    .map(|sibling| sibling.id)
                    .collect();
                self.create_entity_localization(
                    locale_relation,
                    parent.record.remote_id,
                    &other_locale_ids,
                )
                .await
            }
        };
        errors.extend(op_errors);
        if let Some(record) = record {
            records.push(record);
        }

        Ok(())
    }

    /// Resolve one relation value in the remote default locale.
    async fn resolve_default(
        &self,
        old_relation: &RelatedEntity,
        default_existing: &[RemoteEntity],
        created_parents: &[ParentRecord],
        records: &mut Vec<NewRelationRecord>,
        errors: &mut Vec<ErrorItem>,
    ) -> Result<()> {
        let main_value = old_relation.attributes.get(self.main_field);

        // The localized pass may already have created or matched this parent.
        if let Some(parent) = created_parents
            .iter()
            .find(|parent| parent.record.attributes.get(self.main_field) == main_value)
        {
            let mut record = parent.record.clone();
            record.old_id = old_relation.id;
            records.push(record);
            return Ok(());
        }

        if let Some(existing) = default_existing
            .iter()
            .find(|remote| remote.attributes.get(self.main_field) == main_value)
        {
            records.push(NewRelationRecord::new(
                old_relation.id,
                self.target.clone(),
                existing.id,
                existing.attributes.clone(),
            ));
            return Ok(());
        }

        let local_siblings = self.load_local_siblings(old_relation.id).await?;
        let remote_siblings = fetch_filtered(
            &self.client,
            &main_field_texts(&local_siblings, self.main_field),
            self.main_field,
            Some("locale=all"),
        )
        .await;

        let (parent, op_errors) = self
            .create_parent_relation(old_relation, &remote_siblings, &local_siblings)
            .await;
        errors.extend(op_errors);
        if let Some(parent) = parent {
            records.push(parent.record);
        }

        Ok(())
    }

    /// Find or create the parent of a localized variant, in order: a parent
    /// already handled in this run, a remote lookup by main field in the
    /// parent's locale, and finally creation.
    async fn get_create_locale_parent(
        &self,
        existing_parent: Option<ParentRecord>,
        current: &RelatedEntity,
        remote_localizations: &[RemoteEntity],
        local_siblings: &[RelatedEntity],
    ) -> Result<(Option<ParentRecord>, Vec<ErrorItem>)> {
        if existing_parent.is_some() {
            return Ok((existing_parent, Vec::new()));
        }

        let value = current.main_field_text(self.main_field).unwrap_or_default();
        let query = parent_lookup_query(
            self.main_field,
            &value,
            current.locale.as_deref().unwrap_or_default(),
        );
        let response = self.client.fetch(&format!("/?{query}")).await?;
        let remote_parent = parse_entity_list(&response).into_iter().next();

        if let Some(remote) = remote_parent {
            let localizations = remote.localizations();
            return Ok((
                Some(ParentRecord {
                    record: NewRelationRecord::new(
                        current.id,
                        self.target.clone(),
                        remote.id,
                        remote.attributes,
                    ),
                    localizations,
                }),
                Vec::new(),
            ));
        }

        Ok(self
            .create_parent_relation(current, remote_localizations, local_siblings)
            .await)
    }

    /// Create or reconnect a parent entity in the remote default locale.
    ///
    /// When local translations are already connected to remote entities the
    /// parent either exists under another main field value (update it) or
    /// can be attached to those siblings as a new localization. Otherwise it
    /// is created standalone.
    async fn create_parent_relation(
        &self,
        current: &RelatedEntity,
        remote_localizations: &[RemoteEntity],
        local_siblings: &[RelatedEntity],
    ) -> (Option<ParentRecord>, Vec<ErrorItem>) {
        let connected = connected_localizations(
            remote_localizations,
            local_siblings,
            self.main_field,
            current.locale.as_deref(),
        );
        let siblings: Vec<RemoteEntity> = remote_localizations
            .iter()
            .filter(|remote| connected.sibling_ids.contains(&remote.id))
            .cloned()
            .collect();

        let (record, errors) = if let Some(parent) = &connected.main_locale_parent {
            self.update_entity(current, parent.id).await
        } else if !connected.sibling_ids.is_empty() {
            self.create_entity_localization(current, connected.sibling_ids[0], &connected.sibling_ids)
                .await
        } else {
            self.create_entity(current, &[]).await
        };

        (
            record.map(|record| {
                // The parent may be one of the connected siblings; it does
                // not count among its own localizations.
                let localizations = siblings
                    .into_iter()
                    .filter(|sibling| sibling.id != record.remote_id)
                    .collect();
                ParentRecord {
                    record,
                    localizations,
                }
            }),
            errors,
        )
    }

    async fn update_entity(
        &self,
        entity: &RelatedEntity,
        remote_id: RemoteId,
    ) -> (Option<NewRelationRecord>, Vec<ErrorItem>) {
        if !self.create_missing {
            return (None, Vec::new());
        }

        let failure = || {
            ErrorItem::new(format!(
                "Failed to update {} entity {} ({})",
                self.target,
                entity.main_field_text(self.main_field).unwrap_or_default(),
                locale_text(entity)
            ))
        };

        let body = json!({ "data": entity.payload_fields() });
        match self.client.update(&format!("/{remote_id}"), &body).await {
            Ok(response) => match entity_from_envelope(&response) {
                Some(remote) => (
                    Some(NewRelationRecord::new(
                        entity.id,
                        self.target.clone(),
                        remote.id,
                        remote.attributes,
                    )),
                    Vec::new(),
                ),
                None => (None, vec![failure()]),
            },
            Err(err) => (None, vec![failure().with_details(err.error_details())]),
        }
    }

    async fn create_entity(
        &self,
        entity: &RelatedEntity,
        other_locale_ids: &[RemoteId],
    ) -> (Option<NewRelationRecord>, Vec<ErrorItem>) {
        if !self.create_missing {
            return (None, Vec::new());
        }

        let failure = || {
            ErrorItem::new(format!(
                "Failed to create {} entity {} ({})",
                self.target,
                entity.main_field_text(self.main_field).unwrap_or_default(),
                locale_text(entity)
            ))
        };

        let mut fields = entity.payload_fields();
        fields.insert("localizations".to_string(), json!(other_locale_ids));
        let body = json!({ "data": fields });

        match self.client.create("", &body).await {
            Ok(response) => match entity_from_envelope(&response) {
                Some(remote) => (
                    Some(NewRelationRecord::new(
                        entity.id,
                        self.target.clone(),
                        remote.id,
                        remote.attributes,
                    )),
                    Vec::new(),
                ),
                None => (None, vec![failure()]),
            },
            Err(err) => (None, vec![failure().with_details(err.error_details())]),
        }
    }

    async fn create_entity_localization(
        &self,
        entity: &RelatedEntity,
        parent_id: RemoteId,
        other_locale_ids: &[RemoteId],
    ) -> (Option<NewRelationRecord>, Vec<ErrorItem>) {
        if !self.create_missing {
            return (None, Vec::new());
        }

        let failure = || {
            ErrorItem::new(format!(
                "Failed to create localized entity {} for {} with locale {}",
                self.target,
                entity.main_field_text(self.main_field).unwrap_or_default(),
                locale_text(entity)
            ))
        };

        let mut fields = entity.payload_fields();
        fields.insert("localizations".to_string(), json!(other_locale_ids));
        let body = Value::Object(fields);

        let path = format!("/{parent_id}/localizations");
        match self.client.create(&path, &body).await {
            Ok(response) => match entity_from_flat(&response) {
                Some(remote) => (
                    Some(NewRelationRecord::new(
                        entity.id,
                        self.target.clone(),
                        remote.id,
                        remote.attributes,
                    )),
                    Vec::new(),
                ),
                None => (None, vec![failure()]),
            },
            Err(err) => (None, vec![failure().with_details(err.error_details())]),
        }
    }

    /// Local localization siblings of one entity, across all locales.
    async fn load_local_siblings(&self, id: LocalId) -> Result<Vec<RelatedEntity>> {
        let options = FindOptions::default().with_localizations().all_locales();
        let entity = self.store.find_one(self.target, id, &options).await?;
        Ok(entity
            .as_ref()
            .and_then(|value| value.get("localizations"))
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(RelatedEntity::from_value).collect())
            .unwrap_or_default())
    }
}

fn main_field_texts<'a>(
    entities: impl IntoIterator<Item = &'a RelatedEntity>,
    main_field: &str,
) -> Vec<String> {
    entities
        .into_iter()
        .filter_map(|entity| entity.main_field_text(main_field))
        .collect()
}

fn locale_text(entity: &RelatedEntity) -> &str {
    entity.locale.as_deref().unwrap_or("none")
}
