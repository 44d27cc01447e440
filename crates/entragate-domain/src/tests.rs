use crate::types::*;
use crate::validate::*;

// ── entra_group_name (pure) ───────────────────────────────────────────────────

#[test]
fn group_name_strips_subs_prefix() {
    assert_eq!(
        entra_group_name("subs-demo-dev", PermissionLabel::Developer),
        "azure-demo-dev-group-developer"
    );
}

#[test]
fn group_name_all_labels() {
    assert_eq!(
        entra_group_name("subs-pj-prd", PermissionLabel::Admin),
        "azure-pj-prd-group-admin"
    );
    assert_eq!(
        entra_group_name("subs-pj-prd", PermissionLabel::Developer),
        "azure-pj-prd-group-developer"
    );
    assert_eq!(
        entra_group_name("subs-pj-prd", PermissionLabel::Operator),
        "azure-pj-prd-group-operator"
    );
}

#[test]
fn group_name_without_prefix_is_used_verbatim() {
    assert_eq!(
        entra_group_name("legacy-thing", PermissionLabel::Operator),
        "azure-legacy-thing-group-operator"
    );
}

#[test]
fn group_name_strips_prefix_only_once() {
    assert_eq!(
        entra_group_name("subs-subs-x", PermissionLabel::Admin),
        "azure-subs-x-group-admin"
    );
}

// ── RoleLabel tables ──────────────────────────────────────────────────────────

#[test]
fn role_durations() {
    assert_eq!(RoleLabel::Owner.duration_minutes(), 120);
    assert_eq!(RoleLabel::Contributor.duration_minutes(), 480);
}

#[test]
fn role_definition_ids_are_the_builtin_guids() {
    assert_eq!(
        RoleLabel::Owner.definition_id(),
        "8e3af657-a8ff-443c-a75c-2fe8c4bcb635"
    );
    assert_eq!(
        RoleLabel::Contributor.definition_id(),
        "b24988ac-6180-42a0-ab88-20f7382dd24c"
    );
}

// ── FromStr parsing ───────────────────────────────────────────────────────────

#[test]
fn permission_parses_exact_lowercase_only() {
    assert_eq!("admin".parse::<PermissionLabel>().unwrap(), PermissionLabel::Admin);
    assert!("Admin".parse::<PermissionLabel>().is_err());
    assert!("root".parse::<PermissionLabel>().is_err());
}

#[test]
fn role_parses_exact_lowercase_only() {
    assert_eq!("owner".parse::<RoleLabel>().unwrap(), RoleLabel::Owner);
    assert!("OWNER".parse::<RoleLabel>().is_err());
    assert!("reader".parse::<RoleLabel>().is_err());
}

#[test]
fn environment_parses_case_insensitively() {
    assert_eq!("dev".parse::<Environment>().unwrap(), Environment::Dev);
    assert_eq!("PRD".parse::<Environment>().unwrap(), Environment::Prd);
    assert!("qa".parse::<Environment>().is_err());
}

#[test]
fn vnet_type_parses_case_insensitively() {
    assert_eq!("Private".parse::<VNetType>().unwrap(), VNetType::Private);
    assert_eq!("public".parse::<VNetType>().unwrap(), VNetType::Public);
    assert!("hybrid".parse::<VNetType>().is_err());
}

#[test]
fn management_group_is_exact_match() {
    assert_eq!(
        "Sandbox".parse::<ManagementGroup>().unwrap(),
        ManagementGroup::Sandbox
    );
    assert!("sandbox".parse::<ManagementGroup>().is_err());
}

// ── Validators ────────────────────────────────────────────────────────────────

#[test]
fn project_name_accepts_allowed_charset() {
    assert!(check_project_name("demo-app_v1.2").is_ok());
}

#[test]
fn project_name_rejects_empty_long_and_bad_chars() {
    assert!(check_project_name("").is_err());
    assert!(check_project_name(&"a".repeat(56)).is_err());
    assert!(check_project_name("demo app").is_err());
    assert!(check_project_name("demo/app").is_err());
}

#[test]
fn email_accepts_plain_address() {
    assert!(check_email("a@x.com").is_ok());
}

#[test]
fn email_rejects_malformed_addresses() {
    assert!(check_email("").is_err());
    assert!(check_email("nope").is_err());
    assert!(check_email("a@b").is_err());
    assert!(check_email("a b@x.com").is_err());
    assert!(check_email("a@@x.com").is_err());
    let long = format!("{}@x.com", "a".repeat(255));
    assert!(check_email(&long).is_err());
}

#[test]
fn emails_rejects_empty_list_and_bad_entry() {
    assert!(check_emails(&[]).is_err());
    assert!(check_emails(&["a@x.com".into(), "broken".into()]).is_err());
    assert!(check_emails(&["a@x.com".into(), "b@y.org".into()]).is_ok());
}
