//! Auto-population of writable members after construction.

use crate::builder::SpecimenCommand;
use crate::context::SpecimenContext;
use crate::error::{FixtureError, Result};
use crate::reflect::Member;
use crate::request::Request;
use crate::value::{Specimen, Value};

/// Resolve a value for `member` and assign it to `target`
///
/// Returns `false` when the member was omitted.
pub fn resolve_member(
    member: &Member,
    target: &mut Value,
    context: &SpecimenContext<'_>,
) -> Result<bool> {
    match context.resolve(&member.request())? {
        Specimen::Value(value) => {
            member.assign(target, value)?;
            Ok(true)
        }
        Specimen::Omit => Ok(false),
        Specimen::NoSpecimen => Err(FixtureError::unresolved_member(member.info().to_string())),
    }
}

/// Assigns every auto-populated member of a freshly built value, in declaration order
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoPropertiesCommand;

impl SpecimenCommand for AutoPropertiesCommand {
    fn execute(
        &self,
        specimen: &mut Value,
        request: &Request,
        context: &SpecimenContext<'_>,
    ) -> Result<()> {
        if !context.auto_properties() {
            return Ok(());
        }
        let Some(ty) = request.target_type() else {
            return Ok(());
        };
        if specimen.type_id() != ty.id() {
            return Ok(());
        }

        let model = context.model(&ty);
        for member in model.members().iter().filter(|member| member.auto_populate()) {
            resolve_member(member, specimen, context)?;
        }
        Ok(())
    }
}
