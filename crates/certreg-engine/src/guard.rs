//! Precondition guards for mutating entry points.
//!
//! Each operation lists its guards in order; [`enforce`] runs them before
//! anything is staged and stops at the first failure.

use certreg_core::AccountId;

use crate::error::RegistryError;
use crate::staged::Staged;

/// One role check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Guard {
    /// Caller is the configured administrative owner.
    Administrator,
    /// Caller is a currently authorized institution.
    AuthorizedInstitution,
    /// Caller is the administrative owner, or a currently authorized
    /// institution that is the given issuer.
    IssuerOrAdministrator(AccountId),
}

/// Caller identity and the administrator it is compared against.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Principal<'p> {
    pub caller: &'p AccountId,
    pub admin: &'p AccountId,
}

impl Principal<'_> {
    pub(crate) fn is_admin(&self) -> bool {
        self.caller == self.admin
    }
}

fn is_authorized(staged: &Staged<'_>, account: &AccountId) -> bool {
    staged
        .institution(account)
        .map(|inst| inst.authorized)
        .unwrap_or(false)
}

/// Run `guards` in order.
pub(crate) fn enforce(
    guards: &[Guard],
    staged: &Staged<'_>,
    principal: Principal<'_>,
) -> Result<(), RegistryError> {
    for guard in guards {
        match guard {
            Guard::Administrator => {
                if !principal.is_admin() {
                    return Err(RegistryError::unauthorized(format!(
                        "{} is not the administrator",
                        principal.caller
                    )));
                }
            }
            Guard::AuthorizedInstitution => {
                if !is_authorized(staged, principal.caller) {
                    return Err(RegistryError::unauthorized(format!(
                        "{} is not an authorized institution",
                        principal.caller
                    )));
                }
            }
            Guard::IssuerOrAdministrator(issuer) => {
                if principal.is_admin() {
                    continue;
                }
                if !is_authorized(staged, principal.caller) {
                    return Err(RegistryError::unauthorized(format!(
                        "{} is neither an authorized institution nor the administrator",
                        principal.caller
                    )));
                }
                if issuer != principal.caller {
                    return Err(RegistryError::unauthorized(format!(
                        "{} did not issue this certificate",
                        principal.caller
                    )));
                }
            }
        }
    }
    Ok(())
}
