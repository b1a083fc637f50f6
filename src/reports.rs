//! CSV export and import of the product catalog.
//!
//! Both sides share the fixed header contract
//! `Name;Description;Price;Stock;Category;Image URL`. Import auto-creates
//! unknown categories and collects per-row failures instead of aborting
//! the batch.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::catalog::{CatalogService, ProductInput};
use crate::error::ServiceError;

pub const CSV_DELIMITER: u8 = b';';
pub const CSV_HEADER: [&str; 6] = [
    "Name",
    "Description",
    "Price",
    "Stock",
    "Category",
    "Image URL",
];

#[derive(Debug, Clone, Serialize)]
pub struct ImportedRow {
    pub row: usize,
    pub product_id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RowFailure {
    pub row: usize,
    pub message: String,
}

/// Collect-and-report result of an import: successes alongside failures.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub imported: Vec<ImportedRow>,
    pub failures: Vec<RowFailure>,
}

/// Attachment filename for an export produced at `now`.
pub fn attachment_filename(now: DateTime<Utc>) -> String {
    format!("products-{}.csv", now.format("%Y%m%d-%H%M%S"))
}

/// Render the whole catalog as semicolon-delimited CSV.
pub fn export_products_csv(catalog: &CatalogService) -> Result<String, ServiceError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(CSV_DELIMITER)
        .from_writer(Vec::new());

    writer
        .write_record(CSV_HEADER)
        .map_err(|e| ServiceError::Internal(format!("csv write failed: {}", e)))?;

    for product in catalog.list_products()? {
        let category = catalog
            .category(product.category_id)
            .map(|c| c.name)
            .unwrap_or_default();
        writer
            .write_record([
                product.name.as_str(),
                product.description.as_str(),
                &product.unit_price.to_string(),
                &product.stock.to_string(),
                category.as_str(),
                product.image_url.as_deref().unwrap_or(""),
            ])
            .map_err(|e| ServiceError::Internal(format!("csv write failed: {}", e)))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ServiceError::Internal(format!("csv flush failed: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| ServiceError::Internal(format!("csv not utf-8: {}", e)))
}

/// Import products from CSV text. The header row must match the contract
/// exactly; data rows are processed independently, so one bad row costs
/// only itself.
pub fn import_products_csv(
    catalog: &CatalogService,
    data: &str,
) -> Result<ImportReport, ServiceError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(CSV_DELIMITER)
        .flexible(true)
        .from_reader(data.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| ServiceError::InvalidArgument(format!("unreadable header row: {}", e)))?;
    if headers != &csv::StringRecord::from(CSV_HEADER.as_slice()) {
        return Err(ServiceError::InvalidArgument(format!(
            "unexpected header row, expected '{}'",
            CSV_HEADER.join(";")
        )));
    }

    let mut report = ImportReport::default();
    for (index, record) in reader.records().enumerate() {
        let row = index + 2; // 1-based, after the header
        match import_row(catalog, &record) {
            Ok((product_id, name)) => report.imported.push(ImportedRow {
                row,
                product_id,
                name,
            }),
            Err(message) => report.failures.push(RowFailure { row, message }),
        }
    }

    tracing::info!(
        imported = report.imported.len(),
        failed = report.failures.len(),
        "product import finished"
    );
    Ok(report)
}

fn import_row(
    catalog: &CatalogService,
    record: &Result<csv::StringRecord, csv::Error>,
) -> Result<(Uuid, String), String> {
    let record = record.as_ref().map_err(|e| format!("unreadable row: {}", e))?;
    if record.len() != CSV_HEADER.len() {
        return Err(format!(
            "expected {} columns, found {}",
            CSV_HEADER.len(),
            record.len()
        ));
    }

    let name = record[0].trim().to_string();
    let description = record[1].trim().to_string();
    let price: Decimal = record[2]
        .trim()
        .parse()
        .map_err(|_| format!("invalid price '{}'", &record[2]))?;
    let stock: u32 = record[3]
        .trim()
        .parse()
        .map_err(|_| format!("invalid stock '{}'", &record[3]))?;
    let category_name = record[4].trim();
    if category_name.is_empty() {
        return Err("category must not be empty".to_string());
    }
    let image_url = match record[5].trim() {
        "" => None,
        url => Some(url.to_string()),
    };

    let category = catalog
        .ensure_category(category_name)
        .map_err(|e| e.to_string())?;

    let product = catalog
        .create_product(ProductInput {
            code: generated_code(),
            name,
            description,
            unit_price: price,
            stock,
            image_url,
            category_id: category.id,
            supplier_id: None,
        })
        .map_err(|e| e.to_string())?;

    Ok((product.id, product.name))
}

/// Imported rows carry no product code; mint one.
fn generated_code() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("IMP-{}", &id[..8].to_uppercase())
}
