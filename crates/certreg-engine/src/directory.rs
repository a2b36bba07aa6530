//! # Authorization Directory
//!
//! Tracks which issuer accounts may mint, their profile, and how many
//! certificates each has issued.
//!
//! - Registration is self-service and sets the authorization flag. It is
//!   rejected only while the caller is *currently* authorized, so an
//!   account revoked by the administrator may register again, starting
//!   over with a zero issuance count.
//! - Only the administrator clears the flag. Records are never deleted.

use certreg_core::AccountId;

use crate::error::RegistryError;
use crate::events::RegistryEvent;
use crate::guard::{enforce, Guard, Principal};
use crate::model::{Institution, InstitutionStats};
use crate::staged::Staged;
use crate::state::LedgerState;

pub(crate) fn register_institution(
    staged: &mut Staged<'_>,
    caller: &AccountId,
    name: &str,
    email: &str,
) -> Result<(), RegistryError> {
    if staged.institution(caller).is_some_and(|i| i.authorized) {
        return Err(RegistryError::AlreadyRegistered(*caller));
    }
    let institution = Institution {
        name: name.to_string(),
        email: email.to_string(),
        authorized: true,
        registered_at: staged.now(),
        issued_count: 0,
    };
    staged.put_institution(*caller, institution);
    staged.emit(RegistryEvent::InstitutionAuthorized {
        institution: *caller,
        name: name.to_string(),
    })
}

pub(crate) fn revoke_institution(
    staged: &mut Staged<'_>,
    principal: Principal<'_>,
    target: &AccountId,
) -> Result<(), RegistryError> {
    enforce(&[Guard::Administrator], staged, principal)?;
    let mut institution = match staged.institution(target) {
        Some(inst) if inst.authorized => inst.clone(),
        _ => {
            return Err(RegistryError::unauthorized(format!(
                "{target} is not an authorized institution"
            )))
        }
    };
    institution.authorized = false;
    staged.put_institution(*target, institution);
    staged.emit(RegistryEvent::InstitutionRevoked {
        institution: *target,
    })
}

pub(crate) fn update_institution_info(
    staged: &mut Staged<'_>,
    principal: Principal<'_>,
    new_name: &str,
    new_email: &str,
) -> Result<(), RegistryError> {
    enforce(&[Guard::AuthorizedInstitution], staged, principal)?;
    if new_name.is_empty() {
        return Err(RegistryError::invalid("institution name must not be empty"));
    }
    let mut institution = staged
        .institution(principal.caller)
        .cloned()
        .ok_or_else(|| RegistryError::unauthorized("institution record missing"))?;
    institution.name = new_name.to_string();
    institution.email = new_email.to_string();
    staged.put_institution(*principal.caller, institution);
    Ok(())
}

/// Stats for `account`, zero-valued if it never registered.
pub fn institution_stats(state: &LedgerState, account: &AccountId) -> InstitutionStats {
    state
        .institution(account)
        .map(InstitutionStats::from)
        .unwrap_or_default()
}
