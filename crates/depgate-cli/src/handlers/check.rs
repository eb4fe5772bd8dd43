use depgate_core::{DependencyVersion, VersionConstraint};

use crate::error::CliError;
use crate::presentation::render_check;

/// Parse `constraint` and each of `versions`, returning a verdict per version.
pub fn evaluate(
    constraint: &str,
    versions: &[String],
) -> Result<(VersionConstraint, Vec<(DependencyVersion, bool)>), CliError> {
    let constraint = VersionConstraint::parse(constraint)?;
    let verdicts = versions
        .iter()
        .map(|text| -> Result<_, CliError> {
            let version = DependencyVersion::parse(text)?;
            let satisfied = constraint.is_satisfied_by(&version);
            Ok((version, satisfied))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok((constraint, verdicts))
}

/// Execute `depgate check`.
pub fn execute(constraint: &str, versions: &[String]) -> Result<(), CliError> {
    let (constraint, verdicts) = evaluate(constraint, versions)?;
    println!("{}", render_check(&constraint, &verdicts));

    let rejected = verdicts.iter().filter(|(_, satisfied)| !satisfied).count();
    if rejected > 0 {
        return Err(CliError::Incompatible(format!(
            "{rejected} of {} versions do not satisfy '{}'",
            verdicts.len(),
            constraint.as_str()
        )));
    }
    Ok(())
}
