use ahash::AHashMap;
use log::trace;

use crate::constraints::Constraints;
use crate::items::ItemDictionary;
use crate::types::{AssociationRule, FrequentItemset, ItemId, SupportCount};

/// Generate association rules from a set of frequent itemsets.
///
/// For every itemset of at least two items, candidate consequents start as
/// its 1-item subsets and grow level by level. A candidate survives a level
/// only when its rule meets the confidence threshold and the consequent
/// constraints: anything larger built from a failed candidate could at best
/// tie its confidence, so the whole subtree is cut.
///
/// Antecedent supports are taken from `frequent_itemsets` when present;
/// otherwise `support_lookup` is consulted (the coordinator points it at the
/// pattern tree), and as a last resort the minimum support of the
/// antecedent's 1-item subsets. A candidate whose antecedent support cannot
/// be determined is dropped.
pub fn mine_association_rules(
    frequent_itemsets: &[FrequentItemset],
    min_confidence: f64,
    consequent_constraints: &Constraints,
    items: &ItemDictionary,
    support_lookup: impl Fn(&[ItemId]) -> Option<SupportCount>,
) -> Vec<AssociationRule> {
    let supports: AHashMap<&[ItemId], SupportCount> = frequent_itemsets
        .iter()
        .map(|f| (f.itemset.as_slice(), f.support))
        .collect();

    let mut rules = Vec::new();
    for frequent_itemset in frequent_itemsets {
        if frequent_itemset.len() < 2 {
            continue;
        }
        let consequents: Vec<Vec<ItemId>> = frequent_itemset
            .itemset
            .iter()
            .map(|&id| vec![id])
            .collect();
        generate_rules(
            frequent_itemset,
            consequents,
            &supports,
            min_confidence,
            consequent_constraints,
            items,
            &support_lookup,
            &mut rules,
        );
    }
    rules
}

#[allow(clippy::too_many_arguments)]
fn generate_rules(
    frequent_itemset: &FrequentItemset,
    consequents: Vec<Vec<ItemId>>,
    supports: &AHashMap<&[ItemId], SupportCount>,
    min_confidence: f64,
    consequent_constraints: &Constraints,
    items: &ItemDictionary,
    support_lookup: &impl Fn(&[ItemId]) -> Option<SupportCount>,
    rules: &mut Vec<AssociationRule>,
) {
    let itemset_size = frequent_itemset.len();
    let consequent_size = consequents[0].len();

    let mut surviving = Vec::new();
    for consequent in consequents {
        let antecedent: Vec<ItemId> = frequent_itemset
            .itemset
            .iter()
            .copied()
            .filter(|id| !consequent.contains(id))
            .collect();

        let Some(antecedent_support) =
            support_of(&antecedent, supports, support_lookup).filter(|&s| s > 0)
        else {
            trace!("no support known for antecedent {antecedent:?}, dropping");
            continue;
        };

        let confidence = frequent_itemset.support as f64 / antecedent_support as f64;
        if confidence >= min_confidence && consequent_constraints.match_itemset(&consequent) {
            rules.push(AssociationRule {
                antecedent: item_names(&antecedent, items),
                consequent: item_names(&consequent, items),
                support: frequent_itemset.support,
                confidence,
            });
            surviving.push(consequent);
        }
    }

    if !surviving.is_empty() && itemset_size > consequent_size + 1 {
        let candidates = join_consequents(&surviving);
        if !candidates.is_empty() {
            generate_rules(
                frequent_itemset,
                candidates,
                supports,
                min_confidence,
                consequent_constraints,
                items,
                support_lookup,
                rules,
            );
        }
    }
}

fn support_of(
    itemset: &[ItemId],
    supports: &AHashMap<&[ItemId], SupportCount>,
    support_lookup: &impl Fn(&[ItemId]) -> Option<SupportCount>,
) -> Option<SupportCount> {
    if let Some(&support) = supports.get(itemset) {
        return Some(support);
    }
    if let Some(support) = support_lookup(itemset) {
        return Some(support);
    }

    let mut minimum = SupportCount::MAX;
    for &id in itemset {
        match supports.get([id].as_slice()) {
            Some(&support) => minimum = minimum.min(support),
            None => return None,
        }
    }
    Some(minimum)
}

/// Join consequents sharing their first `len - 1` items into candidates one
/// item larger; for 1-item consequents every unordered pair joins once.
fn join_consequents(consequents: &[Vec<ItemId>]) -> Vec<Vec<ItemId>> {
    let shared = consequents[0].len() - 1;
    let mut candidates = Vec::new();
    for (i, left) in consequents.iter().enumerate() {
        for right in &consequents[..i] {
            if left[..shared] == right[..shared] {
                let mut candidate = left.clone();
                candidate.push(right[shared]);
                candidates.push(candidate);
            }
        }
    }
    candidates
}

fn item_names(itemset: &[ItemId], items: &ItemDictionary) -> Vec<String> {
    itemset
        .iter()
        .map(|&id| items.lookup(id).unwrap_or_default().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::ConstraintType;
    use crate::mining::fpgrowth::FpGrowth;
    use crate::types::ItemName;

    fn no_lookup(_: &[ItemId]) -> Option<SupportCount> {
        None
    }

    fn example_frequent_itemsets(items: &mut ItemDictionary) -> Vec<FrequentItemset> {
        let transactions: Vec<Vec<ItemName>> = [
            vec!["A", "B", "C", "D"],
            vec!["A", "B"],
            vec!["A", "C"],
            vec!["A", "B", "C"],
            vec!["A", "D"],
            vec!["A", "C", "D"],
            vec!["C", "B"],
            vec!["B", "C"],
            vec!["C", "D"],
            vec!["C", "E"],
        ]
        .iter()
        .map(|t| t.iter().map(|s| s.to_string()).collect())
        .collect();

        let mut itemset_constraints = Constraints::new();
        let mut consequent_constraints = Constraints::new();
        FpGrowth::new(
            &transactions,
            4,
            items,
            &mut itemset_constraints,
            &mut consequent_constraints,
        )
        .mine_frequent_itemsets()
    }

    #[test]
    fn test_single_high_confidence_rule() {
        let mut items = ItemDictionary::new();
        let frequent = example_frequent_itemsets(&mut items);

        let rules = mine_association_rules(
            &frequent,
            0.8,
            &Constraints::new(),
            &items,
            no_lookup,
        );

        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].antecedent, vec!["B".to_string()]);
        assert_eq!(rules[0].consequent, vec!["C".to_string()]);
        assert_eq!(rules[0].support, 4);
        assert!((rules[0].confidence - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn test_lower_confidence_admits_more_rules() {
        let mut items = ItemDictionary::new();
        let frequent = example_frequent_itemsets(&mut items);

        let rules = mine_association_rules(
            &frequent,
            0.5,
            &Constraints::new(),
            &items,
            no_lookup,
        );

        let as_pairs: Vec<(Vec<String>, Vec<String>)> = rules
            .iter()
            .map(|r| (r.antecedent.clone(), r.consequent.clone()))
            .collect();
        assert_eq!(
            as_pairs,
            vec![
                (vec!["B".to_string()], vec!["C".to_string()]),
                (vec!["C".to_string()], vec!["B".to_string()]),
                (vec!["A".to_string()], vec!["C".to_string()]),
                (vec!["C".to_string()], vec!["A".to_string()]),
            ]
        );
        assert!((rules[2].confidence - 4.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_consequent_constraints_filter_rules() {
        let mut items = ItemDictionary::new();
        let frequent = example_frequent_itemsets(&mut items);

        let mut constraints = Constraints::new();
        constraints.add_item_constraint("C", ConstraintType::PositiveMatchAll);
        constraints.preprocess_item("C", items.id_of("C").unwrap());

        let rules = mine_association_rules(&frequent, 0.5, &constraints, &items, no_lookup);

        // Only rules whose consequent contains C survive.
        assert_eq!(rules.len(), 2);
        assert!(rules
            .iter()
            .all(|r| r.consequent == vec!["C".to_string()]));
    }

    #[test]
    fn test_consequent_expansion_with_fallback_supports() {
        let mut items = ItemDictionary::new();
        for name in ["A", "B", "C"] {
            items.intern(name);
        }

        // Pair supports are deliberately missing: antecedents of expanded
        // consequents fall back to their 1-item subsets.
        let frequent = vec![
            FrequentItemset::new(vec![0], 5),
            FrequentItemset::new(vec![1], 4),
            FrequentItemset::new(vec![2], 3),
            FrequentItemset::new(vec![0, 1, 2], 2),
        ];

        let rules =
            mine_association_rules(&frequent, 0.5, &Constraints::new(), &items, no_lookup);

        // 1-item consequents: {A}: 2/min(4,3) = 2/3, {B}: 2/min(5,3) = 2/3,
        // {C}: 2/min(5,4) = 1/2. All survive. 2-item consequents from the
        // join: {B,A}: 2/3, {C,A}: 1/2, {C,B}: 2/5 < 0.5 dropped.
        assert_eq!(rules.len(), 5);
        let consequents: Vec<Vec<String>> =
            rules.iter().map(|r| r.consequent.clone()).collect();
        assert_eq!(
            consequents,
            vec![
                vec!["A".to_string()],
                vec!["B".to_string()],
                vec!["C".to_string()],
                vec!["B".to_string(), "A".to_string()],
                vec!["C".to_string(), "A".to_string()],
            ]
        );
    }

    #[test]
    fn test_support_lookup_takes_precedence_over_singleton_fallback() {
        let mut items = ItemDictionary::new();
        for name in ["A", "B"] {
            items.intern(name);
        }

        let frequent = vec![
            FrequentItemset::new(vec![0], 10),
            FrequentItemset::new(vec![0, 1], 4),
        ];

        // {B} is not among the frequent itemsets; the external lookup
        // supplies its support.
        let rules = mine_association_rules(
            &frequent,
            0.5,
            &Constraints::new(),
            &items,
            |itemset: &[ItemId]| (itemset == [1]).then_some(5),
        );

        let rule = rules
            .iter()
            .find(|r| r.antecedent == vec!["B".to_string()])
            .unwrap();
        assert!((rule.confidence - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn test_too_small_itemsets_produce_no_rules() {
        let mut items = ItemDictionary::new();
        items.intern("A");
        let frequent = vec![FrequentItemset::new(vec![0], 7)];
        let rules =
            mine_association_rules(&frequent, 0.1, &Constraints::new(), &items, no_lookup);
        assert!(rules.is_empty());
    }
}
