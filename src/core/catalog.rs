//! Catalog business logic - Menu items and the one-time CSV import.
//!
//! The catalog is seeded once from a CSV file with a `name,price` header. The
//! import only runs against an empty catalog; a populated catalog is left as is.
//! Rows that cannot be parsed or stored are reported in the import summary and
//! skipped, they never abort the import.

use crate::{
    entities::{MenuItem, OrderLine, menu_item, order_line},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{PaginatorTrait, QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Deserialize;
use std::{io::Read, path::Path, str::FromStr};
use tracing::{info, instrument, warn};

/// Longest accepted menu item name
pub const MAX_NAME_LEN: usize = 64;

/// One row of the catalog CSV
#[derive(Debug, Deserialize)]
struct CatalogRow {
    name: String,
    price: String,
}

/// A CSV row that was not imported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFailure {
    /// 1-based line number in the CSV file (the header is line 1)
    pub line: u64,
    /// Why the row was skipped
    pub reason: String,
}

/// Result of importing a CSV file into an empty catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Number of menu items created
    pub inserted: u64,
    /// Rows that were skipped
    pub failures: Vec<RowFailure>,
}

/// What [`import_catalog`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    /// The catalog already had items, nothing was read
    AlreadyPopulated {
        /// Number of items already present
        existing: u64,
    },
    /// The file was imported
    Imported(ImportSummary),
}

fn parse_price(raw: &str) -> Result<Decimal> {
    let price = Decimal::from_str(raw.trim()).map_err(|_| Error::InvalidPrice {
        price: raw.to_string(),
    })?;
    if price.is_sign_negative() {
        return Err(Error::InvalidPrice {
            price: raw.to_string(),
        });
    }
    Ok(price)
}

fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Validation {
            message: "Menu item name cannot be empty".to_string(),
        });
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(Error::Validation {
            message: format!("Menu item name cannot exceed {MAX_NAME_LEN} characters"),
        });
    }
    Ok(name.to_string())
}

/// Creates a menu item after validating its name and price.
///
/// # Errors
/// Returns an error if:
/// - The name is empty or longer than [`MAX_NAME_LEN`]
/// - The price is negative
/// - The database insert fails
pub async fn create_menu_item<C: ConnectionTrait>(
    db: &C,
    name: &str,
    price: Decimal,
) -> Result<menu_item::Model> {
    let name = validate_name(name)?;
    if price.is_sign_negative() {
        return Err(Error::InvalidPrice {
            price: price.to_string(),
        });
    }

    let item = menu_item::ActiveModel {
        name: Set(name),
        price: Set(price),
        ..Default::default()
    };
    item.insert(db).await.map_err(Into::into)
}

/// Retrieves a menu item by id.
pub async fn get_menu_item_by_id<C: ConnectionTrait>(
    db: &C,
    menu_id: i64,
) -> Result<Option<menu_item::Model>> {
    MenuItem::find_by_id(menu_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists the whole catalog in insertion order.
pub async fn list_menu_items(db: &DatabaseConnection) -> Result<Vec<menu_item::Model>> {
    MenuItem::find()
        .order_by_asc(menu_item::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Number of menu items in the catalog.
pub async fn count_menu_items<C: ConnectionTrait>(db: &C) -> Result<u64> {
    MenuItem::find().count(db).await.map_err(Into::into)
}

/// Deletes a menu item and every order line referencing it.
///
/// Order amounts are not touched, so orders that contained the item keep
/// their old totals.
#[instrument(skip(db))]
pub async fn delete_menu_item(db: &DatabaseConnection, menu_id: i64) -> Result<u64> {
    let txn = db.begin().await?;

    MenuItem::find_by_id(menu_id)
        .one(&txn)
        .await?
        .ok_or(Error::MenuItemNotFound { id: menu_id })?;

    let removed = OrderLine::delete_many()
        .filter(order_line::Column::MenuId.eq(menu_id))
        .exec(&txn)
        .await?
        .rows_affected;
    MenuItem::delete_by_id(menu_id).exec(&txn).await?;

    txn.commit().await?;
    info!(
        "Deleted menu item {} and {} order line(s) referencing it",
        menu_id, removed
    );
    Ok(removed)
}

/// `Some(AlreadyPopulated)` when the catalog has items and no import may run.
async fn populated_catalog(db: &DatabaseConnection) -> Result<Option<ImportOutcome>> {
    let existing = count_menu_items(db).await?;
    if existing == 0 {
        return Ok(None);
    }
    info!("Catalog already has {} item(s), skipping import.", existing);
    Ok(Some(ImportOutcome::AlreadyPopulated { existing }))
}

/// Imports catalog rows from any CSV reader into an empty catalog.
///
/// See [`import_catalog`] for the file-based entry point.
pub async fn import_catalog_from_reader<R: Read>(
    db: &DatabaseConnection,
    reader: R,
) -> Result<ImportOutcome> {
    if let Some(outcome) = populated_catalog(db).await? {
        return Ok(outcome);
    }
    import_rows(db, reader).await
}

async fn import_rows<R: Read>(db: &DatabaseConnection, reader: R) -> Result<ImportOutcome> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut summary = ImportSummary::default();

    for (index, record) in csv_reader.deserialize::<CatalogRow>().enumerate() {
        // header is line 1
        let line = index as u64 + 2;
        let stored = match record {
            Ok(row) => match parse_price(&row.price) {
                Ok(price) => create_menu_item(db, &row.name, price).await,
                Err(e) => Err(e),
            },
            Err(e) => Err(Error::from(e)),
        };

        match stored {
            Ok(item) => {
                info!("Row inserted: {} - {} @ {}", item.id, item.name, item.price);
                summary.inserted += 1;
            }
            Err(e) => {
                warn!("Unable to insert row {}: {}", line, e);
                summary.failures.push(RowFailure {
                    line,
                    reason: e.to_string(),
                });
            }
        }
    }

    info!(
        "Successfully added {} menu item(s) to the catalog ({} row(s) skipped).",
        summary.inserted,
        summary.failures.len()
    );
    Ok(ImportOutcome::Imported(summary))
}

/// Seeds an empty catalog from the CSV file at `path`.
///
/// The file is only opened when the catalog is empty, so a populated
/// catalog needs no CSV on disk.
///
/// # Errors
/// Returns an error if the file cannot be opened or the database cannot be
/// queried. Individual bad rows are reported in the summary instead.
#[instrument(skip(db))]
pub async fn import_catalog(db: &DatabaseConnection, path: &Path) -> Result<ImportOutcome> {
    if let Some(outcome) = populated_catalog(db).await? {
        return Ok(outcome);
    }
    let file = std::fs::File::open(path)?;
    import_rows(db, file).await
}
