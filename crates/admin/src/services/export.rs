//! CSV exports of orders and products.
//!
//! Quoting follows RFC 4180 via the `csv` crate. Timestamps are RFC 3339
//! in UTC; empty cells mean "not set".

use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;

use keystall_core::{StockCounts, StockLevel};

use crate::models::{AdminProduct, OrderExportRow};

const ORDER_HEADERS: [&str; 10] = [
    "order_number",
    "created_at",
    "status",
    "customer_email",
    "product",
    "variant",
    "delivery_type",
    "total",
    "cost",
    "verified_at",
];

const PRODUCT_HEADERS: [&str; 10] = [
    "id",
    "slug",
    "name",
    "category",
    "delivery_type",
    "original_price",
    "sale_price",
    "cost_price",
    "stock",
    "active",
];

/// Error writing an export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("csv buffer error: {0}")]
    Buffer(String),
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>, ExportError> {
    writer
        .into_inner()
        .map_err(|e| ExportError::Buffer(e.error().to_string()))
}

/// Orders as CSV.
///
/// # Errors
///
/// Returns `ExportError` if a record cannot be written.
pub fn orders_csv(rows: &[OrderExportRow]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(ORDER_HEADERS)?;

    for row in rows {
        let record: [&str; 10] = [
            row.order_number.as_str(),
            &timestamp(row.created_at),
            row.status.as_str(),
            &row.customer_email,
            &row.product_name,
            row.variant_name.as_deref().unwrap_or_default(),
            row.delivery_type.as_str(),
            &row.total.to_string(),
            &row.unit_cost.map(|c| c.to_string()).unwrap_or_default(),
            &row.verified_at.map(timestamp).unwrap_or_default(),
        ];
        writer.write_record(record)?;
    }

    finish(writer)
}

/// Products with their current stock as CSV.
///
/// # Errors
///
/// Returns `ExportError` if a record cannot be written.
pub fn products_csv(
    products: &[AdminProduct],
    counts: &StockCounts,
) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(PRODUCT_HEADERS)?;

    for product in products {
        let stock = match counts.level(
            product.id,
            None,
            product.uses_stock_keys,
            product.manual_stock,
        ) {
            StockLevel::Unlimited => "unlimited".to_owned(),
            StockLevel::Limited(n) => n.to_string(),
        };
        let record: [&str; 10] = [
            &product.id.to_string(),
            &product.slug,
            &product.name,
            &product.category,
            product.delivery_type.as_str(),
            &product.original_price.to_string(),
            &product.sale_price.map(|p| p.to_string()).unwrap_or_default(),
            &product.cost_price.map(|p| p.to_string()).unwrap_or_default(),
            &stock,
            if product.is_active { "true" } else { "false" },
        ];
        writer.write_record(record)?;
    }

    finish(writer)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use keystall_core::{DeliveryType, OrderNumber, OrderStatus, ProductId};

    use super::*;

    fn created() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 10, 9, 30, 0).unwrap()
    }

    fn product(id: i32, uses_stock_keys: bool, manual_stock: Option<i32>) -> AdminProduct {
        AdminProduct {
            id: ProductId::new(id),
            slug: format!("product-{id}"),
            name: "Office Suite, \"Pro\" edition".to_owned(),
            description: String::new(),
            category: "software".to_owned(),
            image_path: None,
            original_price: "120".parse().unwrap(),
            sale_price: None,
            cost_price: Some("40.5".parse().unwrap()),
            delivery_type: DeliveryType::InstantKey,
            uses_stock_keys,
            manual_stock,
            flash_sale_cut: None,
            flash_sale_ends_at: None,
            features: vec![],
            is_active: true,
            created_at: created(),
            updated_at: created(),
        }
    }

    fn order_row(
        number: &str,
        status: OrderStatus,
        verified_at: Option<DateTime<Utc>>,
    ) -> OrderExportRow {
        OrderExportRow {
            order_number: OrderNumber::parse(number).unwrap(),
            created_at: created(),
            status,
            customer_email: "ana@mail.com".to_owned(),
            product_name: "Streamflix Premium".to_owned(),
            variant_name: Some("3 months".to_owned()),
            delivery_type: DeliveryType::Credentials,
            total: "115".parse().unwrap(),
            unit_cost: None,
            verified_at,
        }
    }

    #[test]
    fn test_orders_csv_shape() {
        let rejected_at = created() + chrono::Duration::minutes(45);
        let rows = vec![
            order_row("KS-260510-7XK2QP", OrderStatus::Completed, Some(created())),
            order_row("KS-260510-9RT4WZ", OrderStatus::Cancelled, Some(rejected_at)),
            order_row("KS-260510-3MN8HV", OrderStatus::Submitted, None),
        ];

        let csv = String::from_utf8(orders_csv(&rows).unwrap()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "order_number,created_at,status,customer_email,product,variant,delivery_type,total,cost,verified_at"
        );
        assert_eq!(
            lines[1],
            "KS-260510-7XK2QP,2026-05-10T09:30:00Z,completed,ana@mail.com,Streamflix Premium,3 months,credentials,115.00,,2026-05-10T09:30:00Z"
        );
        assert_eq!(
            lines[2],
            "KS-260510-9RT4WZ,2026-05-10T09:30:00Z,cancelled,ana@mail.com,Streamflix Premium,3 months,credentials,115.00,,2026-05-10T10:15:00Z"
        );
        assert!(
            lines[3]
                .ends_with(",submitted,ana@mail.com,Streamflix Premium,3 months,credentials,115.00,,")
        );
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_products_csv_quotes_and_stock() {
        let counts = StockCounts::from_rows([(ProductId::new(1), None, 7)]);
        let products = vec![
            product(1, true, None),
            product(2, false, None),
            product(3, false, Some(2)),
        ];

        let csv = String::from_utf8(products_csv(&products, &counts).unwrap()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[1],
            "1,product-1,\"Office Suite, \"\"Pro\"\" edition\",software,instant_key,120.00,,40.50,7,true"
        );
        assert!(lines[2].ends_with(",unlimited,true"));
        assert!(lines[3].ends_with(",2,true"));
    }
}
