//! Product-tree extraction and device identity equivalence.
//!
//! All operations are stateless reads over one advisory; duplicates from
//! overlapping structural sources are preserved (callers tolerate them).

use strum::IntoEnumIterator;

use crate::models::{
    Advisory, Branch, FullProductName, IdentificationHelper, ProductStatusCategory,
    RemediationCategory, Vulnerability,
};

/// Collect every product entry of an advisory from its three structural
/// sources, concatenated without deduplication:
///
/// 1. the flat `full_product_names` list,
/// 2. the product referenced by each relationship entry,
/// 3. a pre-order, left-to-right traversal of the branch hierarchy where
///    a branch without children yields its own product.
pub fn extract_all_products(advisory: &Advisory) -> Vec<&FullProductName> {
    let mut products = Vec::new();

    let Some(tree) = &advisory.product_tree else {
        return products;
    };

    products.extend(tree.full_product_names.iter());

    for relationship in &tree.relationships {
        products.push(&relationship.full_product_name);
    }

    for branch in &tree.branches {
        recurse_branches(branch, &mut products);
    }

    // product_groups carry no product ids, so there is no fourth source

    products
}

fn recurse_branches<'a>(branch: &'a Branch, out: &mut Vec<&'a FullProductName>) {
    match &branch.branches {
        Some(children) if !children.is_empty() => {
            for child in children {
                recurse_branches(child, out);
            }
        }
        _ => {
            if let Some(product) = &branch.product {
                out.push(product);
            }
        }
    }
}

/// Whether two products identify the same device.
///
/// Identifier kinds are checked in priority order, first match wins:
/// CPE, file-hash triple (filename, algorithm, value), package URL,
/// model numbers, serial numbers, SKUs. A product without
/// identification-helper data never matches anything.
pub fn identities_match(a: &FullProductName, b: &FullProductName) -> bool {
    match (
        &a.product_identification_helper,
        &b.product_identification_helper,
    ) {
        (Some(a), Some(b)) => helpers_match(a, b),
        _ => false,
    }
}

/// Identity equivalence on the helper bundles themselves. Symmetric by
/// construction: every check compares the same kind on both sides.
pub fn helpers_match(a: &IdentificationHelper, b: &IdentificationHelper) -> bool {
    if let (Some(cpe_a), Some(cpe_b)) = (&a.cpe, &b.cpe) {
        if cpe_a == cpe_b {
            return true;
        }
    }

    if let (Some(hashes_a), Some(hashes_b)) = (&a.hashes, &b.hashes) {
        if any_hash_triple_shared(hashes_a, hashes_b) {
            return true;
        }
    }

    if let (Some(purl_a), Some(purl_b)) = (&a.purl, &b.purl) {
        if purl_a == purl_b {
            return true;
        }
    }

    if let (Some(models_a), Some(models_b)) = (&a.model_numbers, &b.model_numbers) {
        if any_shared(models_a, models_b) {
            return true;
        }
    }

    if let (Some(serials_a), Some(serials_b)) = (&a.serial_numbers, &b.serial_numbers) {
        if any_shared(serials_a, serials_b) {
            return true;
        }
    }

    if let (Some(skus_a), Some(skus_b)) = (&a.skus, &b.skus) {
        if any_shared(skus_a, skus_b) {
            return true;
        }
    }

    false
}

/// A (filename, algorithm, value) triple shared across both hash sets
fn any_hash_triple_shared(
    a: &[crate::models::HashCollection],
    b: &[crate::models::HashCollection],
) -> bool {
    for coll_a in a {
        for coll_b in b {
            if coll_a.filename != coll_b.filename {
                continue;
            }
            for hash_a in &coll_a.file_hashes {
                for hash_b in &coll_b.file_hashes {
                    if hash_a.algorithm == hash_b.algorithm && hash_a.value == hash_b.value {
                        return true;
                    }
                }
            }
        }
    }
    false
}

/// Any common entry between two string sets, position-independent
fn any_shared(a: &[String], b: &[String]) -> bool {
    a.iter().any(|item| b.contains(item))
}

/// Vulnerability records in which the product's identifier appears under
/// any of the requested product-status categories. An empty category
/// list means all eight. Each matching record appears once.
pub fn find_vulnerabilities_for_product<'a>(
    advisory: &'a Advisory,
    product: &FullProductName,
    categories: &[ProductStatusCategory],
) -> Vec<&'a Vulnerability> {
    let all: Vec<ProductStatusCategory>;
    let requested = if categories.is_empty() {
        all = ProductStatusCategory::iter().collect();
        &all
    } else {
        categories
    };

    advisory
        .vulnerabilities
        .iter()
        .filter(|vulnerability| {
            let Some(status) = &vulnerability.product_status else {
                return false;
            };
            requested.iter().any(|category| {
                status
                    .ids_for(*category)
                    .is_some_and(|ids| ids.contains(&product.product_id))
            })
        })
        .collect()
}

/// Whether at least one remediation entry's category is in the requested
/// set. An empty set means all five categories count.
pub fn has_remediation(
    vulnerability: &Vulnerability,
    categories: &[RemediationCategory],
) -> bool {
    vulnerability.remediations.iter().any(|remediation| {
        categories.is_empty() || categories.contains(&remediation.category)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FileHash, HashCollection, ProductStatus, Remediation};

    fn product(id: &str, helper: Option<IdentificationHelper>) -> FullProductName {
        FullProductName {
            product_id: id.to_string(),
            name: format!("Product {id}"),
            product_identification_helper: helper,
        }
    }

    fn leaf(id: &str) -> Branch {
        Branch {
            name: None,
            category: None,
            product: Some(product(id, None)),
            branches: None,
        }
    }

    fn node(children: Vec<Branch>) -> Branch {
        Branch {
            name: None,
            category: None,
            product: None,
            branches: Some(children),
        }
    }

    fn advisory_with_branches(branches: Vec<Branch>) -> Advisory {
        let raw = serde_json::json!({
            "document": {
                "category": "csaf_security_advisory",
                "title": "t",
                "publisher": { "name": "p", "namespace": "ns", "category": "vendor" },
                "tracking": {
                    "id": "ID-1",
                    "status": "final",
                    "initial_release_date": "2024-01-01T00:00:00Z"
                },
                "distribution": { "tlp": { "label": "WHITE" } }
            }
        });
        let mut advisory: Advisory = serde_json::from_value(raw).unwrap();
        advisory.product_tree = Some(crate::models::ProductTree {
            full_product_names: vec![],
            relationships: vec![],
            branches,
        });
        advisory
    }

    #[test]
    fn test_branch_extraction_counts_leaves() {
        // depth 3, uneven branching: 4 leaves
        let tree = vec![
            node(vec![leaf("L1"), node(vec![leaf("L2"), leaf("L3")])]),
            leaf("L4"),
        ];
        let advisory = advisory_with_branches(tree);
        let products = extract_all_products(&advisory);
        assert_eq!(products.len(), 4);
        let ids: Vec<_> = products.iter().map(|p| p.product_id.as_str()).collect();
        // pre-order, left to right
        assert_eq!(ids, vec!["L1", "L2", "L3", "L4"]);
    }

    #[test]
    fn test_extraction_concatenates_all_sources_without_dedup() {
        let mut advisory = advisory_with_branches(vec![leaf("DUP")]);
        let tree = advisory.product_tree.as_mut().unwrap();
        tree.full_product_names.push(product("DUP", None));
        tree.relationships.push(crate::models::Relationship {
            full_product_name: product("DUP", None),
            category: None,
        });
        assert_eq!(extract_all_products(&advisory).len(), 3);
    }

    #[test]
    fn test_no_product_tree_yields_nothing() {
        let mut advisory = advisory_with_branches(vec![]);
        advisory.product_tree = None;
        assert!(extract_all_products(&advisory).is_empty());
    }

    fn helper_with_cpe(cpe: &str) -> IdentificationHelper {
        IdentificationHelper {
            cpe: Some(cpe.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_cpe_match() {
        let a = product("A", Some(helper_with_cpe("cpe:2.3:o:vendor:fw:1.0")));
        let b = product("B", Some(helper_with_cpe("cpe:2.3:o:vendor:fw:1.0")));
        let c = product("C", Some(helper_with_cpe("cpe:2.3:o:vendor:fw:2.0")));
        assert!(identities_match(&a, &b));
        assert!(!identities_match(&a, &c));
    }

    #[test]
    fn test_missing_helper_never_matches() {
        let a = product("A", None);
        let b = product("B", Some(helper_with_cpe("cpe:2.3:o:vendor:fw:1.0")));
        assert!(!identities_match(&a, &b));
        assert!(!identities_match(&a, &a));
    }

    #[test]
    fn test_hash_triple_requires_all_three_fields() {
        let hashes = |filename: &str, algorithm: &str, value: &str| {
            Some(vec![HashCollection {
                filename: filename.to_string(),
                file_hashes: vec![FileHash {
                    algorithm: algorithm.to_string(),
                    value: value.to_string(),
                }],
            }])
        };
        let a = product(
            "A",
            Some(IdentificationHelper {
                hashes: hashes("fw.bin", "sha256", "abc"),
                ..Default::default()
            }),
        );
        let same = product(
            "B",
            Some(IdentificationHelper {
                hashes: hashes("fw.bin", "sha256", "abc"),
                ..Default::default()
            }),
        );
        let other_file = product(
            "C",
            Some(IdentificationHelper {
                hashes: hashes("fw2.bin", "sha256", "abc"),
                ..Default::default()
            }),
        );
        assert!(identities_match(&a, &same));
        assert!(!identities_match(&a, &other_file));
    }

    #[test]
    fn test_overlapping_sets_match_position_independent() {
        let a = product(
            "A",
            Some(IdentificationHelper {
                serial_numbers: Some(vec!["S1".into(), "S2".into(), "S3".into()]),
                ..Default::default()
            }),
        );
        let b = product(
            "B",
            Some(IdentificationHelper {
                serial_numbers: Some(vec!["S9".into(), "S3".into()]),
                ..Default::default()
            }),
        );
        assert!(identities_match(&a, &b));
    }

    #[test]
    fn test_identity_relation_is_symmetric() {
        let samples = vec![
            product("A", Some(helper_with_cpe("cpe:x"))),
            product("B", Some(helper_with_cpe("cpe:y"))),
            product(
                "C",
                Some(IdentificationHelper {
                    purl: Some("pkg:generic/fw@1.0".into()),
                    ..Default::default()
                }),
            ),
            product("D", None),
        ];
        for a in &samples {
            for b in &samples {
                assert_eq!(identities_match(a, b), identities_match(b, a));
            }
        }
    }

    fn vulnerability_with_status(status: ProductStatus) -> Vulnerability {
        Vulnerability {
            cve: None,
            product_status: Some(status),
            scores: vec![],
            remediations: vec![],
        }
    }

    #[test]
    fn test_find_vulnerabilities_defaults_to_all_categories() {
        let mut advisory = advisory_with_branches(vec![]);
        advisory.vulnerabilities = vec![vulnerability_with_status(ProductStatus {
            recommended: Some(vec!["P-1".into()]),
            ..Default::default()
        })];
        let target = product("P-1", None);
        assert_eq!(
            find_vulnerabilities_for_product(&advisory, &target, &[]).len(),
            1
        );
    }

    #[test]
    fn test_find_vulnerabilities_respects_requested_categories() {
        let mut advisory = advisory_with_branches(vec![]);
        advisory.vulnerabilities = vec![
            vulnerability_with_status(ProductStatus {
                fixed: Some(vec!["P-1".into()]),
                ..Default::default()
            }),
            vulnerability_with_status(ProductStatus {
                known_affected: Some(vec!["P-1".into()]),
                ..Default::default()
            }),
        ];
        let target = product("P-1", None);
        let matched = find_vulnerabilities_for_product(
            &advisory,
            &target,
            &[ProductStatusCategory::KnownAffected],
        );
        // the fixed-only record is excluded
        assert_eq!(matched.len(), 1);
        assert!(matched[0]
            .product_status
            .as_ref()
            .unwrap()
            .known_affected
            .is_some());
    }

    #[test]
    fn test_record_listed_in_two_categories_appears_once() {
        let mut advisory = advisory_with_branches(vec![]);
        advisory.vulnerabilities = vec![vulnerability_with_status(ProductStatus {
            first_affected: Some(vec!["P-1".into()]),
            known_affected: Some(vec!["P-1".into()]),
            ..Default::default()
        })];
        let target = product("P-1", None);
        assert_eq!(
            find_vulnerabilities_for_product(&advisory, &target, &[]).len(),
            1
        );
    }

    #[test]
    fn test_has_remediation() {
        let vulnerability = Vulnerability {
            cve: None,
            product_status: None,
            scores: vec![],
            remediations: vec![Remediation {
                category: RemediationCategory::VendorFix,
                details: None,
            }],
        };
        assert!(has_remediation(&vulnerability, &[]));
        assert!(has_remediation(
            &vulnerability,
            &[RemediationCategory::VendorFix]
        ));
        assert!(!has_remediation(
            &vulnerability,
            &[RemediationCategory::Workaround]
        ));

        let bare = Vulnerability {
            cve: None,
            product_status: None,
            scores: vec![],
            remediations: vec![],
        };
        assert!(!has_remediation(&bare, &[]));
    }
}
