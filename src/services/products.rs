// Products service
// Client-side search, filtering and labelling over a loaded product list.

use crate::types::{PlanEntry, Product};

/// Case-insensitive search over product, allergen and additive names.
///
/// A blank query returns every product.
pub fn search_products<'a>(products: &'a [Product], query: &str) -> Vec<&'a Product> {
    let term = query.trim().to_lowercase();
    if term.is_empty() {
        return products.iter().collect();
    }

    products
        .iter()
        .filter(|p| {
            p.name.to_lowercase().contains(&term)
                || p.allergens.iter().any(|a| a.name.to_lowercase().contains(&term))
                || p.additives.iter().any(|a| a.name.to_lowercase().contains(&term))
        })
        .collect()
}

pub fn filter_by_allergen<'a>(products: &'a [Product], allergen_id: &str) -> Vec<&'a Product> {
    products
        .iter()
        .filter(|p| p.allergens.iter().any(|a| a.id == allergen_id))
        .collect()
}

pub fn filter_by_additive<'a>(products: &'a [Product], additive_id: &str) -> Vec<&'a Product> {
    products
        .iter()
        .filter(|p| p.additives.iter().any(|a| a.id == additive_id))
        .collect()
}

/// Sort additive ids numerically when both sides are numbers, otherwise
/// lexicographically.
pub fn sort_additive_ids(ids: &mut [String]) {
    ids.sort_by(|a, b| match (a.parse::<u32>(), b.parse::<u32>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.cmp(b),
    });
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogStats {
    pub total: usize,
    pub with_allergens: usize,
    pub with_additives: usize,
}

pub fn catalog_stats(products: &[Product]) -> CatalogStats {
    CatalogStats {
        total: products.len(),
        with_allergens: products.iter().filter(|p| p.has_allergens()).count(),
        with_additives: products.iter().filter(|p| p.has_additives()).count(),
    }
}

/// Printable text of a plan entry.
///
/// Products carry their codes in parentheses, or on a second line when the
/// product is flagged multiline. A group label is prefixed in brackets.
pub fn entry_label(entry: &PlanEntry) -> String {
    let text = match &entry.product {
        Some(product) => {
            let codes = product.codes().join(",");
            if codes.is_empty() {
                product.name.clone()
            } else if product.multiline {
                format!("{}\n  [{}]", product.name, codes)
            } else {
                format!("{} ({})", product.name, codes)
            }
        }
        None => entry.custom_text.clone().unwrap_or_default(),
    };

    match entry.group_label.as_deref() {
        Some(group) if !group.is_empty() => format!("[{}] {}", group, text),
        _ => text,
    }
}
