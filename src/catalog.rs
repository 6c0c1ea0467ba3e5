//! Catalog master data and product import.
//!
//! The allergen table follows the EU food information regulation (LMIV,
//! 14 allergens `a`..`n`), the additive table the German labelling codes.
//! Product imports come from a JSON export whose rows carry the codes as
//! free text in two columns (`allergens1`, `allergens2`).

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use crate::error::StoreError;
use crate::store::ProductStore;
use crate::types::{Additive, Allergen, ProductDraft};

pub const EU_ALLERGENS: [(&str, &str); 14] = [
    ("a", "glutenhaltiges Getreide (Weizen, Roggen, Gerste, Hafer, Dinkel, Kamut)"),
    ("b", "Krebstiere"),
    ("c", "Eier"),
    ("d", "Fisch"),
    ("e", "Erdnüsse"),
    ("f", "Soja(bohnen)"),
    ("g", "Milch (einschließlich Laktose)"),
    (
        "h",
        "Schalenfrüchte (Mandeln, Haselnüsse, Walnüsse, Cashew, Pecan, Paranüsse, Pistazien, Macadamia)",
    ),
    ("i", "Sellerie"),
    ("j", "Senf"),
    ("k", "Sesamsamen"),
    ("l", "Schwefeldioxid und Sulfite (> 10 mg/kg oder mg/l)"),
    ("m", "Lupine"),
    ("n", "Weichtiere"),
];

pub const ADDITIVES: [(&str, &str); 24] = [
    ("A", "Antioxidationsmittel"),
    ("B", "Backtriebmittel"),
    ("E", "Emulgator"),
    ("F", "Farbstoff"),
    ("FM", "Festigungsmittel"),
    ("FH", "Feuchthaltemittel"),
    ("FÜ", "Füllstoff"),
    ("G", "Geliermittel"),
    ("GV", "Geschmacksverstärker"),
    ("K", "Konservierungsstoff"),
    ("M", "Mehlbehandlungsmittel"),
    ("MS", "Modifizierte Stärke"),
    ("R", "Rieselhilfe"),
    ("S", "Säuerungsmittel"),
    ("SR", "Säureregulator"),
    ("SV", "Schaumverhüter"),
    ("SCH", "Schmelzsalz"),
    ("ST", "Stabilisator"),
    ("SÜ", "Süßungsmittel"),
    ("T", "Trägerstoff"),
    ("TG", "Treibgas"),
    ("TM", "Trennmittel"),
    ("Ü", "Überzugsmittel"),
    ("V", "Verdickungsmittel"),
];

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Failed to read import file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse product JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to store product '{name}': {source}")]
    Store { name: String, source: StoreError },
}

/// One row of the product export.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProductImport {
    pub name: String,
    #[serde(default)]
    pub multiline: bool,
    #[serde(default)]
    pub allergens1: String,
    #[serde(default)]
    pub allergens2: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub created: usize,
    pub skipped: usize,
}

/// Insert the allergen and additive tables into an empty catalog.
///
/// Returns false when allergens already exist and nothing was touched.
pub fn seed_catalog(store: &dyn ProductStore) -> Result<bool, StoreError> {
    if !store.list_allergens()?.is_empty() {
        log::debug!("Catalog already seeded");
        return Ok(false);
    }

    for (id, name) in EU_ALLERGENS {
        store.insert_allergen(Allergen {
            id: id.to_string(),
            name: name.to_string(),
            category: "allergen".to_string(),
        })?;
    }
    for (id, name) in ADDITIVES {
        store.insert_additive(Additive {
            id: id.to_string(),
            name: name.to_string(),
        })?;
    }

    log::info!(
        "Seeded catalog with {} allergens and {} additives",
        EU_ALLERGENS.len(),
        ADDITIVES.len()
    );
    Ok(true)
}

fn allergen_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b[a-n]\b").expect("valid allergen regex"))
}

fn additive_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b[A-ZÄÖÜ]{1,3}\b").expect("valid additive regex"))
}

/// Split the two free-text code columns into allergen and additive ids.
///
/// Allergens are standalone lowercase letters `a`..`n`, additives
/// standalone uppercase tokens of one to three letters. Duplicates are
/// dropped and first-seen order is kept.
pub fn parse_allergen_codes(allergens1: &str, allergens2: &str) -> (Vec<String>, Vec<String>) {
    let combined = format!("{}, {}", allergens1.trim(), allergens2.trim());

    let collect = |pattern: &Regex| {
        let mut ids: Vec<String> = Vec::new();
        for m in pattern.find_iter(&combined) {
            if !ids.iter().any(|id| id == m.as_str()) {
                ids.push(m.as_str().to_string());
            }
        }
        ids
    };

    (collect(allergen_pattern()), collect(additive_pattern()))
}

/// Build a product draft from an import row, dropping codes the catalog
/// does not know.
fn draft_from_import(
    row: &ProductImport,
    known_allergens: &[Allergen],
    known_additives: &[Additive],
) -> ProductDraft {
    let (allergen_ids, additive_ids) = parse_allergen_codes(&row.allergens1, &row.allergens2);

    let allergen_ids = allergen_ids
        .into_iter()
        .filter(|id| {
            let known = known_allergens.iter().any(|a| &a.id == id);
            if !known {
                log::debug!("Ignoring unknown allergen '{}' on '{}'", id, row.name);
            }
            known
        })
        .collect();
    let additive_ids = additive_ids
        .into_iter()
        .filter(|id| {
            let known = known_additives.iter().any(|a| &a.id == id);
            if !known {
                log::debug!("Ignoring unknown additive '{}' on '{}'", id, row.name);
            }
            known
        })
        .collect();

    ProductDraft {
        name: row.name.trim().to_string(),
        multiline: row.multiline,
        allergen_ids,
        additive_ids,
    }
}

/// Create every product of the export that does not exist yet.
pub fn import_products(store: &dyn ProductStore, json: &str) -> Result<ImportSummary, ImportError> {
    let rows: Vec<ProductImport> = serde_json::from_str(json)?;
    let to_store_err = |name: &str| {
        let name = name.to_string();
        move |source| ImportError::Store { name, source }
    };

    let allergens = store.list_allergens().map_err(to_store_err("<catalog>"))?;
    let additives = store.list_additives().map_err(to_store_err("<catalog>"))?;

    let mut summary = ImportSummary::default();
    for row in &rows {
        let draft = draft_from_import(row, &allergens, &additives);
        if draft.name.is_empty() {
            summary.skipped += 1;
            continue;
        }
        if store
            .find_product_by_name(&draft.name)
            .map_err(to_store_err(&draft.name))?
            .is_some()
        {
            summary.skipped += 1;
            continue;
        }
        store
            .create_product(&draft)
            .map_err(to_store_err(&draft.name))?;
        summary.created += 1;
    }

    log::info!(
        "Imported {} products ({} skipped)",
        summary.created,
        summary.skipped
    );
    Ok(summary)
}

pub fn import_products_from_file(
    store: &dyn ProductStore,
    path: &Path,
) -> Result<ImportSummary, ImportError> {
    let content = std::fs::read_to_string(path)?;
    import_products(store, &content)
}
