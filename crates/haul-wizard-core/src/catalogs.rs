// SPDX-License-Identifier: AGPL-3.0
// Haul Wizard Core - Built-in form catalogs
//
// Field lists for the driver screens. Catalog ids match the keys used in
// `WizardSettings::layouts`.

use crate::catalog::FieldCatalog;
use crate::field::{FieldDescriptor, FieldKind, VisibilityRule};
use crate::types::CatalogError;

pub const CMR_FORM: &str = "cmr";
pub const STATUS_FORM: &str = "status";
pub const MODIFY_TRANSPORT_FORM: &str = "modify-transport";

/// Options for country pickers
pub const COUNTRIES: &[&str] = &[
    "Austria",
    "Belgium",
    "Bulgaria",
    "Croatia",
    "Czech Republic",
    "Denmark",
    "Estonia",
    "Finland",
    "France",
    "Germany",
    "Greece",
    "Hungary",
    "Italy",
    "Latvia",
    "Lithuania",
    "Luxembourg",
    "Netherlands",
    "Norway",
    "Poland",
    "Portugal",
    "Romania",
    "Slovakia",
    "Slovenia",
    "Spain",
    "Sweden",
    "Switzerland",
    "Ukraine",
    "United Kingdom",
];

const OK: &str = "OK";
const NOT_OK: &str = "NotOK";

fn ok_not_ok() -> FieldKind {
    FieldKind::single_select([OK, NOT_OK])
}

fn countries() -> FieldKind {
    FieldKind::country_select(COUNTRIES.iter().copied())
}

/// Consignment note (CMR) data entry
pub fn cmr_form() -> Result<FieldCatalog, CatalogError> {
    FieldCatalog::new(
        CMR_FORM,
        "CMR consignment note",
        vec![
            FieldDescriptor::new("sender_name", "Sender", FieldKind::Text)
                .placeholder("Company name"),
            FieldDescriptor::new("consignee_name", "Consignee", FieldKind::Text)
                .placeholder("Company name"),
            FieldDescriptor::new("loading_place", "Place of loading", FieldKind::Text)
                .placeholder("City"),
            FieldDescriptor::new("loading_country", "Country of loading", countries()),
            FieldDescriptor::new("loading_date", "Date of loading", FieldKind::Date)
                .placeholder("YYYY-MM-DD"),
            FieldDescriptor::new("delivery_place", "Place of delivery", FieldKind::Text)
                .placeholder("City"),
            FieldDescriptor::new("delivery_country", "Country of delivery", countries()),
            FieldDescriptor::new("package_count", "Number of packages", FieldKind::Number)
                .placeholder("0"),
            FieldDescriptor::new("gross_weight_kg", "Gross weight (kg)", FieldKind::Decimal)
                .placeholder("0.0"),
            FieldDescriptor::new("goods_condition", "Condition of goods", ok_not_ok())
                .controls("damage_description", VisibilityRule::equals(NOT_OK)),
            FieldDescriptor::new("damage_description", "Describe the damage", FieldKind::Text),
            FieldDescriptor::new("cmr_photo", "Photo of the CMR", FieldKind::PhotoCapture),
        ],
    )
}

/// General transport status report
pub fn status_form() -> Result<FieldCatalog, CatalogError> {
    FieldCatalog::new(
        STATUS_FORM,
        "Transport status",
        vec![
            FieldDescriptor::new("loading_status", "Loading", ok_not_ok())
                .controls("loading_problems", VisibilityRule::equals(NOT_OK)),
            FieldDescriptor::new("loading_problems", "Loading problems", FieldKind::Text),
            FieldDescriptor::new("arrival_date", "Arrival date", FieldKind::Date)
                .placeholder("YYYY-MM-DD"),
            FieldDescriptor::new("odometer_km", "Odometer (km)", FieldKind::Number),
            FieldDescriptor::new("unloading_status", "Unloading", ok_not_ok())
                .controls("unloading_problems", VisibilityRule::equals(NOT_OK)),
            FieldDescriptor::new("unloading_problems", "Unloading problems", FieldKind::Text),
            FieldDescriptor::new(
                "seal_intact",
                "Seal intact",
                FieldKind::single_select(["Yes", "No"]),
            )
            .controls("seal_remarks", VisibilityRule::equals("No")),
            FieldDescriptor::new("seal_remarks", "Seal remarks", FieldKind::Text),
            FieldDescriptor::new("fuel_liters", "Fuel added (l)", FieldKind::Decimal),
            FieldDescriptor::new("status_photo", "Status photo", FieldKind::PhotoCapture),
        ],
    )
}

/// Changes to an assigned transport
pub fn modify_transport_form() -> Result<FieldCatalog, CatalogError> {
    FieldCatalog::new(
        MODIFY_TRANSPORT_FORM,
        "Modify transport",
        vec![
            FieldDescriptor::new("truck_plate", "Truck plate", FieldKind::Text),
            FieldDescriptor::new("trailer_plate", "Trailer plate", FieldKind::Text),
            FieldDescriptor::new("planned_departure", "Planned departure", FieldKind::Date)
                .placeholder("YYYY-MM-DD"),
            FieldDescriptor::new(
                "route_changed",
                "Route changed",
                FieldKind::single_select(["No", "Yes"]),
            )
            .controls("new_route", VisibilityRule::equals("Yes")),
            FieldDescriptor::new("new_route", "New route", FieldKind::Text),
            FieldDescriptor::new("border_country", "Border crossing", countries()),
        ],
    )
}
