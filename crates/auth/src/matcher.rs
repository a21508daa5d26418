//! Pure role-matching policy.

use crate::{RoleAssignment, RoleCheck};

/// Decide whether any of `checks` is satisfied by any of `assignments`.
///
/// This is a double existential: a call site passes the complete set of
/// grants it would accept, and access is allowed when the caller holds at
/// least one of them. An empty `checks` list never grants access; call sites
/// must state their requirements explicitly.
///
/// - No IO
/// - No panics
/// - No side effects
pub fn has_matching_role(assignments: &[RoleAssignment], checks: &[RoleCheck]) -> bool {
    checks
        .iter()
        .any(|check| assignments.iter().any(|a| check.is_satisfied_by(a)))
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;
    use wareflow_core::{BranchId, OrgId};

    use crate::{RoleAssignment, RoleCheck, has_matching_role, well_known};

    fn org_owner_at(org_id: OrgId) -> RoleAssignment {
        RoleAssignment::org(well_known::ORG_OWNER, org_id)
    }

    #[test]
    fn exact_org_scope_match() {
        let org_id = OrgId::new();
        let assignments = vec![org_owner_at(org_id)];

        let checks = vec![RoleCheck::org(well_known::ORG_OWNER, org_id)];
        assert!(has_matching_role(&assignments, &checks));
    }

    #[test]
    fn different_org_id_does_not_match() {
        let assignments = vec![org_owner_at(OrgId::new())];

        let checks = vec![RoleCheck::org(well_known::ORG_OWNER, OrgId::new())];
        assert!(!has_matching_role(&assignments, &checks));
    }

    #[test]
    fn empty_checks_never_grant() {
        let assignments = vec![org_owner_at(OrgId::new())];
        assert!(!has_matching_role(&assignments, &[]));
        assert!(!has_matching_role(&[], &[]));
    }

    #[test]
    fn scope_kind_must_match_even_when_ids_collide() {
        // An org check must not be satisfied by a branch assignment that
        // happens to carry the same raw id.
        let raw = Uuid::now_v7();
        let assignments = vec![RoleAssignment::branch(
            well_known::ORG_OWNER,
            BranchId::from_uuid(raw),
        )];

        let checks = vec![RoleCheck::org(well_known::ORG_OWNER, OrgId::from_uuid(raw))];
        assert!(!has_matching_role(&assignments, &checks));
    }

    #[test]
    fn any_scope_matches_on_role_name_alone() {
        let assignments = vec![RoleAssignment::branch(
            well_known::BRANCH_MANAGER,
            BranchId::new(),
        )];

        let checks = vec![RoleCheck::any(well_known::BRANCH_MANAGER)];
        assert!(has_matching_role(&assignments, &checks));
    }

    #[test]
    fn any_id_matches_either_scope_kind() {
        let raw = Uuid::now_v7();

        let org_assignment = vec![RoleAssignment::org(
            well_known::STAFF,
            OrgId::from_uuid(raw),
        )];
        let branch_assignment = vec![RoleAssignment::branch(
            well_known::STAFF,
            BranchId::from_uuid(raw),
        )];

        let checks = vec![RoleCheck::any_id(well_known::STAFF, raw)];
        assert!(has_matching_role(&org_assignment, &checks));
        assert!(has_matching_role(&branch_assignment, &checks));

        let other = vec![RoleCheck::any_id(well_known::STAFF, Uuid::now_v7())];
        assert!(!has_matching_role(&org_assignment, &other));
    }

    #[test]
    fn role_name_mismatch_never_matches() {
        let org_id = OrgId::new();
        let assignments = vec![RoleAssignment::org(well_known::ORG_ADMIN, org_id)];

        let checks = vec![RoleCheck::org(well_known::ORG_OWNER, org_id)];
        assert!(!has_matching_role(&assignments, &checks));
    }

    #[test]
    fn any_check_satisfied_is_enough() {
        let org_id = OrgId::new();
        let assignments = vec![org_owner_at(org_id)];

        let checks = vec![
            RoleCheck::org(well_known::ORG_ADMIN, org_id),
            RoleCheck::org(well_known::ORG_OWNER, org_id),
        ];
        assert!(has_matching_role(&assignments, &checks));
    }

    mod properties {
        use proptest::prelude::*;
        use uuid::Uuid;
        use wareflow_core::{BranchId, OrgId};

        use crate::{Role, RoleAssignment, RoleCheck, ScopeFilter, has_matching_role};

        fn role_strategy() -> impl Strategy<Value = Role> {
            prop_oneof![
                Just(Role::from_static("org_owner")),
                Just(Role::from_static("org_admin")),
                Just(Role::from_static("branch_manager")),
                Just(Role::from_static("staff")),
            ]
        }

        fn uuid_strategy() -> impl Strategy<Value = Uuid> {
            any::<u128>().prop_map(Uuid::from_u128)
        }

        fn assignment_strategy() -> impl Strategy<Value = RoleAssignment> {
            (role_strategy(), uuid_strategy(), any::<bool>()).prop_map(|(role, id, org)| {
                if org {
                    RoleAssignment::org(role, OrgId::from_uuid(id))
                } else {
                    RoleAssignment::branch(role, BranchId::from_uuid(id))
                }
            })
        }

        proptest! {
            #[test]
            fn empty_checks_are_vacuously_false(
                assignments in prop::collection::vec(assignment_strategy(), 0..16)
            ) {
                prop_assert!(!has_matching_role(&assignments, &[]));
            }

            #[test]
            fn an_exactly_mirrored_check_always_matches(
                assignments in prop::collection::vec(assignment_strategy(), 1..16),
                pick in any::<prop::sample::Index>(),
            ) {
                let chosen = &assignments[pick.index(assignments.len())];
                let check = match chosen.scope {
                    crate::RoleScope::Org(id) => RoleCheck::org(chosen.role.clone(), id),
                    crate::RoleScope::Branch(id) => RoleCheck::branch(chosen.role.clone(), id),
                };
                prop_assert!(has_matching_role(&assignments, &[check]));
            }

            #[test]
            fn matching_is_monotone_in_checks(
                assignments in prop::collection::vec(assignment_strategy(), 0..8),
                role in role_strategy(),
                id in uuid_strategy(),
            ) {
                // Adding a check can only widen access, never revoke it.
                let base = vec![RoleCheck { role: role.clone(), scope: ScopeFilter::AnyId(id) }];
                let mut widened = base.clone();
                widened.push(RoleCheck { role, scope: ScopeFilter::Any });

                if has_matching_role(&assignments, &base) {
                    prop_assert!(has_matching_role(&assignments, &widened));
                }
            }

            #[test]
            fn any_id_agrees_with_raw_scope_id(
                assignment in assignment_strategy(),
            ) {
                let check = RoleCheck::any_id(assignment.role.clone(), assignment.scope.id());
                prop_assert!(has_matching_role(std::slice::from_ref(&assignment), &[check]));
            }
        }
    }
}
