//! Refresh
//!
//! The once-per-render reconciliation of the basket against the Actualizer
//! snapshot and the subcontract-service catalog. Repairs are applied in
//! place; any unrecovered failure aborts without committing and leaves the
//! partial repairs un-snapshotted.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::{
    actualizer::{ActualizerItem, ActualizerItems},
    basket::{Basket, errors::RefreshError},
    catalog::CatalogError,
    finder,
    items::{
        Item, ItemId, UniqId,
        additions::Additions,
        problems::{Info, InfoCode, Problem, ProblemCode},
        types::ItemType,
    },
};

/// Ceiling applied when the Actualizer never set one.
pub const DEFAULT_MAX_COUNT: u32 = 999;

impl Basket {
    /// Reconcile the basket against fresh pricing/availability data.
    ///
    /// Problems are recomputed from scratch; structural inconsistencies are
    /// repaired silently. There is no rollback: after an error the basket
    /// keeps whatever repairs were already made, and the fingerprint is not
    /// committed — callers re-invoke or discard.
    #[tracing::instrument(
        name = "basket.refresh",
        skip_all,
        fields(space_id = %self.data().space_id(), positions = self.data().positions_count()),
        err
    )]
    pub async fn refresh(
        &mut self,
        actualizer: &dyn ActualizerItems,
    ) -> Result<(), RefreshError> {
        self.reset_problems();
        self.data_mut().set_possible_configuration(false);

        self.sweep_orphans_and_subcontracts().await?;

        let refresher = Arc::clone(self.refresher());
        refresher
            .refresh(self)
            .await
            .map_err(RefreshError::Refresher)?;

        self.reconcile_items(actualizer);
        self.diff_presents(actualizer);
        self.fix_services_for_conf_products(actualizer)?;
        self.rollup_configuration();

        self.data_mut().commit_changes();
        debug!(
            positions = self.data().positions_count(),
            cost = self.data().cost(),
            "basket refreshed"
        );
        Ok(())
    }

    fn reset_problems(&mut self) {
        let snapshot: Vec<UniqId> = self.data().all().iter().map(|i| i.uniq_id).collect();
        for uniq_id in snapshot {
            if let Some(item) = self.data_mut().get_mut(uniq_id) {
                item.clear_problems();
                if item.simulate_problems {
                    item.add_problem(Problem::new(ProblemCode::NotAvailable));
                }
            }
        }
    }

    /// One pass over all items: delete orphans whose parent vanished, and
    /// swap out subcontract services that became unavailable for this
    /// customer type.
    async fn sweep_orphans_and_subcontracts(&mut self) -> Result<(), RefreshError> {
        let b2b = self.user().is_b2b();
        let snapshot: Vec<UniqId> = self.data().all().iter().map(|i| i.uniq_id).collect();

        for uniq_id in snapshot {
            // An earlier cascade may already have taken this one.
            let Some(item) = self.data().get(uniq_id) else {
                continue;
            };

            if let Some(parent_id) = item.parent_uniq_id
                && self.data().get(parent_id).is_none()
            {
                warn!(%uniq_id, item_id = %item.item_id, "orphaned item removed from basket");
                self.data_mut().remove(uniq_id);
                continue;
            }

            if !self.replace_subcontract_services()
                || item.item_type != ItemType::SubcontractService
            {
                continue;
            }

            let Some(parent_id) = item.parent_uniq_id else {
                continue;
            };
            let Some(parent) = self.data().get(parent_id) else {
                continue;
            };

            let parent_item_id = parent.item_id.clone();
            let item_id = item.item_id.clone();
            let name = item.name.clone();
            let count = item.count;
            let own_replacement = item
                .service_additions()
                .and_then(|s| s.replacement_item_id.clone());
            let space_id = self.data().space_id().clone();

            let services = match self
                .catalog()
                .find_services(&parent_item_id, &space_id)
                .await
            {
                Ok(services) => services,
                Err(CatalogError::NotFound) => {
                    if let Some(item) = self.data_mut().get_mut(uniq_id) {
                        item.add_problem(Problem::new(ProblemCode::NotAvailable));
                    }
                    continue;
                }
                Err(err) => return Err(RefreshError::Catalog(err)),
            };

            let record = services.iter().find(|r| r.item_id == item_id);
            let allowed = record.is_some_and(|r| if b2b { r.allowed_b2b } else { r.allowed_b2c });
            if allowed {
                continue;
            }

            let replacement = own_replacement
                .or_else(|| record.and_then(|r| r.replacement_item_id.clone()));

            let substituted = match replacement {
                Some(replacement_id) => self
                    .add(
                        replacement_id,
                        ItemType::SubcontractService,
                        Some(parent_id),
                        count,
                        false,
                    )
                    .await
                    .is_ok(),
                None => false,
            };

            let code = if substituted {
                InfoCode::PositionChanged
            } else {
                InfoCode::PositionRemoved
            };
            self.data_mut().add_info(Info::new(code, item_id, name));
            self.data_mut().remove(uniq_id);
        }

        Ok(())
    }

    /// Per-item reconciliation against the Actualizer snapshot.
    fn reconcile_items(&mut self, actualizer: &dyn ActualizerItems) {
        let snapshot: Vec<UniqId> = self.data().all().iter().map(|i| i.uniq_id).collect();

        for uniq_id in snapshot {
            let Some(item) = self.data().get(uniq_id) else {
                continue;
            };

            if item.count == 0 {
                self.data_mut().remove(uniq_id);
                continue;
            }

            let spec = item.spec();
            if spec.count_le_parent
                && !spec.count_eq_parent
                && let Some(parent_id) = item.parent_uniq_id
                && let Some(parent) = self.data().get(parent_id)
            {
                let parent_count = parent.count;
                if let Some(item) = self.data_mut().get_mut(uniq_id) {
                    item.rules.max_count = Some(parent_count);
                    if item.count > parent_count {
                        item.add_problem(Problem::new(ProblemCode::MaxCountExceeded));
                    }
                }
            }

            let Some(item) = self.data().get(uniq_id) else {
                continue;
            };
            let Some(row) = actualizer.find_by_item(item).cloned() else {
                // Configuration members are skipped: the root owns the
                // diagnosis for the whole composite.
                let spec = item.spec();
                let code = if spec.is_present {
                    Some(ProblemCode::NotAvailable)
                } else if !spec.part_of_configuration {
                    Some(ProblemCode::ImpossibleToOrder)
                } else {
                    None
                };
                if let Some(code) = code
                    && let Some(item) = self.data_mut().get_mut(uniq_id)
                {
                    item.add_problem(Problem::new(code));
                }
                continue;
            };

            if let Some(item) = self.data_mut().get_mut(uniq_id) {
                apply_actualizer_row(item, &row);
            }
        }
    }

    /// Synthesize presents the Actualizer granted but the basket lacks.
    fn diff_presents(&mut self, actualizer: &dyn ActualizerItems) {
        let rows: Vec<ActualizerItem> = actualizer
            .find_by_type(ItemType::Present)
            .into_iter()
            .cloned()
            .collect();

        let mut granted: FxHashMap<ItemId, usize> = FxHashMap::default();

        for row in rows {
            if row.count == 0 || row.not_exist {
                continue;
            }

            let seen = granted.entry(row.item_id.clone()).or_insert(0);
            *seen += 1;

            let held = self
                .data()
                .find(|i| i.item_type == ItemType::Present && i.item_id == row.item_id)
                .len();
            if *seen <= held {
                continue;
            }

            let parent_uniq_id = row.parent_item_id.as_ref().and_then(|parent_item_id| {
                self.data()
                    .find(|i| i.spec().is_product && &i.item_id == parent_item_id)
                    .first()
                    .map(|parent| parent.uniq_id)
            });

            let mut present = Item::new(
                row.item_id.clone(),
                ItemType::Present,
                row.count,
                self.data().space_id().clone(),
                self.data().price_column(),
            );
            present.name = row.name.clone();
            present.price = row.price;
            present.parent_uniq_id = parent_uniq_id;

            if let Err(err) = self.data_mut().add(present) {
                warn!(item_id = %row.item_id, error = %err, "can't grant present");
            }
        }
    }

    /// Synthesize configuration-member services the Actualizer knows about
    /// but the basket lost.
    fn fix_services_for_conf_products(
        &mut self,
        actualizer: &dyn ActualizerItems,
    ) -> Result<(), RefreshError> {
        let rows: Vec<ActualizerItem> = actualizer
            .find_by_type(ItemType::ConfigurationService)
            .into_iter()
            .cloned()
            .collect();

        for row in rows {
            let held = self
                .data()
                .find(|i| i.item_type == ItemType::ConfigurationService && i.item_id == row.item_id)
                .len();
            if held > 0 {
                continue;
            }

            let Some(parent_item_id) = row.parent_item_id.clone() else {
                continue;
            };

            let parent = self
                .data()
                .find(|i| {
                    i.item_type == ItemType::ConfigurationProduct && i.item_id == parent_item_id
                })
                .first()
                .map(|parent| (parent.uniq_id, parent.count))
                .ok_or(RefreshError::MissingConfigurationProduct(parent_item_id))?;
            let (parent_uniq_id, parent_count) = parent;

            let conf_additions = self
                .data()
                .configuration()
                .and_then(|conf| conf.configuration_additions())
                .cloned();

            let mut service = Item::new(
                row.item_id.clone(),
                ItemType::ConfigurationService,
                parent_count,
                self.data().space_id().clone(),
                self.data().price_column(),
            );
            service.name = row.name.clone();
            service.price = row.price;
            service.parent_uniq_id = Some(parent_uniq_id);
            if let Some(additions) = conf_additions {
                service.additions = Additions::Configuration(additions);
            }

            if let Err(err) = self.data_mut().add(service) {
                warn!(item_id = %row.item_id, error = %err, "can't restore configuration service");
            }
        }

        Ok(())
    }

    /// Write the members' aggregated cost and bonus onto the configuration
    /// root.
    fn rollup_configuration(&mut self) {
        let totals = {
            let Some(conf) = self.data().configuration() else {
                return;
            };
            let all = self.data().all();
            let members = finder::children_of_recursive(&all, conf);

            let cost: u64 = members
                .iter()
                .filter(|m| m.spec().part_of_configuration)
                .map(|m| u64::from(m.count) * m.price)
                .sum();
            let bonus: u64 = members
                .iter()
                .filter(|m| m.spec().part_of_configuration)
                .map(|m| u64::from(m.count) * u64::from(m.bonus))
                .sum();

            (conf.uniq_id, cost, bonus)
        };
        let (conf_id, cost, bonus) = totals;
        let bonus = u32::try_from(bonus).unwrap_or(u32::MAX);

        if let Some(conf) = self.data_mut().get_mut(conf_id) {
            if conf.price != cost {
                if conf.price > 0 {
                    let info = Info::new(
                        InfoCode::PriceChanged {
                            old: conf.price,
                            new: cost,
                        },
                        conf.item_id.clone(),
                        conf.name.clone(),
                    );
                    conf.add_info(info);
                }
                conf.set_price(cost);
            }
            if conf.bonus != bonus {
                conf.bonus = bonus;
                conf.changed = true;
            }
        }
    }
}

/// Apply one authoritative row onto its basket item.
fn apply_actualizer_row(item: &mut Item, row: &ActualizerItem) {
    let spec = item.spec();

    if spec.is_present {
        item.set_count(row.count);
    }

    match item.item_type {
        ItemType::AssemblyService | ItemType::ConfigurationService => {
            item.name = row.name.clone();
            if row.price != item.price {
                if item.price > 0 {
                    let info = Info::new(
                        InfoCode::PriceChanged {
                            old: item.price,
                            new: row.price,
                        },
                        item.item_id.clone(),
                        item.name.clone(),
                    );
                    item.add_info(info);
                }
                item.set_price(row.price);
            }
        }
        ItemType::Configuration => {
            item.name = row.name.clone();
        }
        _ => {}
    }

    // Count is never locally authoritative for configuration members.
    if spec.part_of_configuration {
        item.set_count(row.count);
    }

    if row.not_exist {
        item.add_problem(Problem::new(ProblemCode::NotAvailable));
    }

    match &row.reduce {
        Some(reduce) => {
            item.rules.max_count = Some(reduce.max_count);
            if item.count > reduce.max_count {
                item.add_problem(Problem::with_message(
                    ProblemCode::MaxCountExceeded,
                    reduce.reason.clone(),
                ));
            }
        }
        None => {
            if item.rules.max_count.is_none() {
                item.rules.max_count = Some(DEFAULT_MAX_COUNT);
            }
        }
    }

    if item.price == 0
        && !spec.is_present
        && !spec.is_configuration
        && !item.has_problem(ProblemCode::NotAvailable)
    {
        item.add_problem(Problem::new(ProblemCode::NotAvailable));
    }
}
