//! Display labels for requirement trees.

use super::{Check, CheckKind, Requirement};

/// A short label for a requirement, e.g. `STR ≥ 12 & Has item: Key`.
///
/// Unknown leaves describe as the empty string and are dropped from
/// combinator labels.
pub fn describe(requirement: Option<&Requirement>) -> String {
    requirement.map(describe_node).unwrap_or_default()
}

fn describe_node(requirement: &Requirement) -> String {
    match requirement {
        Requirement::AllOf(children) => join(children, " & "),
        Requirement::AnyOf(children) => join(children, " | "),
        Requirement::Not(inner) => format!("NOT ({})", describe_node(inner)),
        Requirement::Check(check) => describe_check(check),
    }
}

fn join(children: &[Requirement], separator: &str) -> String {
    children
        .iter()
        .map(describe_node)
        .filter(|label| !label.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}

fn describe_check(check: &Check) -> String {
    let value = check.value.as_ref().map(ToString::to_string);
    let shown = || value.clone().unwrap_or_else(|| "?".to_string());
    let op = |fallback: &str| {
        check
            .op
            .as_ref()
            .map(|op| op.as_str().to_string())
            .unwrap_or_else(|| fallback.to_string())
    };

    match &check.kind {
        CheckKind::Ability if check.roll => {
            format!("{} check DC {}", check.key.to_uppercase(), shown())
        }
        CheckKind::Ability => format!("{} {} {}", check.key.to_uppercase(), op("≥"), shown()),
        CheckKind::Skill => format!(
            "Skill {} ≥ {}",
            check.key.to_uppercase(),
            value.clone().unwrap_or_else(|| "10".to_string())
        ),
        CheckKind::Race => format!("Race: {}", shown()),
        CheckKind::Language => format!("Language: {}", shown()),
        CheckKind::Spell => format!("Spell known: {}", shown()),
        CheckKind::Proficiency => format!("Proficiency: {}", check.subject().to_uppercase()),
        CheckKind::Item => format!("Has item: {}", shown()),
        CheckKind::Flag => format!(
            "Flag {} {} {}",
            check.key,
            op("=="),
            value.clone().unwrap_or_else(|| "true".to_string())
        ),
        CheckKind::PreviousAction => format!("Did: {}", check.subject()),
        CheckKind::Relation => format!("Relation {} {}", op(">="), shown()),
        CheckKind::GmOnly => "GM only".to_string(),
        CheckKind::Unknown(_) => String::new(),
    }
}
