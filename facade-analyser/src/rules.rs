use std::collections::BTreeMap;

use facade_api::{Decision, DeviceCategory, Rule};

/// Checks the conditions of a rule and collects the text of those that hold.
///
/// Returns `None` as soon as one checked condition falls below its
/// threshold. Conditions on categories missing from `inputs`, or on inputs
/// that are not a known category, are skipped without blocking the rule.
fn matched_conditions(inputs: &BTreeMap<DeviceCategory, f64>, rule: &Rule) -> Option<Vec<String>> {
    let mut passed = Vec::with_capacity(rule.inputs.len());

    for condition in &rule.inputs {
        let Some((category, value)) = condition
            .category
            .category()
            .and_then(|category| inputs.get_key_value(&category))
        else {
            continue;
        };

        if *value < condition.threshold {
            return None;
        }

        passed.push(format!(
            "{}: {} >= {}",
            category, value, condition.threshold
        ));
    }

    Some(passed)
}

/// Folds the rule list over one input snapshot.
///
/// Starts from the default decision; every fully matching rule overwrites
/// the outputs it names, so a later match wins over an earlier one.
pub fn evaluate(inputs: &BTreeMap<DeviceCategory, f64>, rules: &[Rule]) -> Decision {
    let mut decision = Decision::default();

    for rule in rules {
        let Some(passed) = matched_conditions(inputs, rule) else {
            continue;
        };

        let reason = passed.join(", ");
        for action in &rule.outputs {
            let state = decision.output_mut(action.output);
            state.value = action.setting;
            state.reason = reason.clone();
        }
    }

    decision
}
