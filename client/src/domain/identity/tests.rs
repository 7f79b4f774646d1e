//! Tests for the identity data model.

use super::*;
use rstest::{fixture, rstest};
use serde_json::json;

const VALID_ID: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

#[fixture]
fn admin() -> Identity {
    Identity::new(
        UserId::new(VALID_ID).expect("valid id"),
        DisplayName::new("Ada Lovelace").expect("valid name"),
        Email::new("ada@example.com").expect("valid email"),
        Some(Role::Admin),
    )
}

#[rstest]
#[case("", IdentityValidationError::EmptyId)]
#[case("not-a-uuid", IdentityValidationError::InvalidId)]
#[case(" 3fa85f64-5717-4562-b3fc-2c963f66afa6", IdentityValidationError::InvalidId)]
fn user_id_rejects_invalid_input(#[case] raw: &str, #[case] expected: IdentityValidationError) {
    assert_eq!(UserId::new(raw).expect_err("must fail"), expected);
}

#[rstest]
fn user_id_keeps_raw_string() {
    let id = UserId::new(VALID_ID).expect("valid id");
    assert_eq!(id.as_ref(), VALID_ID);
    assert_eq!(id.as_uuid().to_string(), VALID_ID);
}

#[rstest]
#[case("   ", IdentityValidationError::EmptyDisplayName)]
#[case("", IdentityValidationError::EmptyDisplayName)]
fn display_name_rejects_blank(#[case] raw: &str, #[case] expected: IdentityValidationError) {
    assert_eq!(DisplayName::new(raw).expect_err("must fail"), expected);
}

#[rstest]
fn display_name_rejects_overlong_values() {
    let raw = "a".repeat(DISPLAY_NAME_MAX + 1);
    assert_eq!(
        DisplayName::new(raw).expect_err("must fail"),
        IdentityValidationError::DisplayNameTooLong {
            max: DISPLAY_NAME_MAX
        }
    );
}

#[rstest]
fn display_name_is_trimmed() {
    let name = DisplayName::new("  Grace Hopper ").expect("valid name");
    assert_eq!(name.as_ref(), "Grace Hopper");
}

#[rstest]
#[case("ada@example.com", true)]
#[case("  ada@example.com ", true)]
#[case("ada.example.com", false)]
#[case("ada@example", false)]
#[case("a da@example.com", false)]
fn email_shape_is_checked(#[case] raw: &str, #[case] valid: bool) {
    assert_eq!(Email::new(raw).is_ok(), valid);
}

#[rstest]
#[case("admin", Some(Role::Admin))]
#[case("user", Some(Role::User))]
#[case("Admin", None)]
#[case("owner", None)]
#[case("", None)]
fn role_parse_accepts_only_wire_values(#[case] raw: &str, #[case] expected: Option<Role>) {
    assert_eq!(Role::parse(raw), expected);
}

#[rstest]
fn role_from_str_reports_unknown_values() {
    let err = "owner".parse::<Role>().expect_err("unknown role");
    assert_eq!(
        err,
        IdentityValidationError::UnknownRole {
            value: "owner".to_owned()
        }
    );
}

#[rstest]
fn admin_identity_grants_admin_access(admin: Identity) {
    assert!(admin.is_admin());
    let access = admin.admin_access().expect("admin access");
    assert_eq!(access.admin_id(), admin.id());
}

#[rstest]
#[case(Some(Role::User))]
#[case(None)]
fn non_admin_identity_has_no_admin_access(admin: Identity, #[case] role: Option<Role>) {
    let other = admin.with_profile(admin.name().clone(), admin.email().clone(), role);
    assert!(!other.is_admin());
    assert!(other.admin_access().is_none());
}

#[rstest]
fn deserialises_users_row() {
    let value = json!({
        "id": VALID_ID,
        "name": "Ada",
        "email": "ada@example.com",
        "role": "user"
    });
    let identity: Identity = serde_json::from_value(value).expect("row decodes");
    assert_eq!(identity.role(), Some(Role::User));
    assert_eq!(identity.name().as_ref(), "Ada");
}

#[rstest]
#[case(json!({ "id": VALID_ID, "name": "Ada", "email": "ada@example.com", "role": "superuser" }))]
#[case(json!({ "id": VALID_ID, "name": "Ada", "email": "ada@example.com", "role": null }))]
#[case(json!({ "id": VALID_ID, "name": "Ada", "email": "ada@example.com" }))]
fn unknown_or_missing_role_decodes_as_none(#[case] value: serde_json::Value) {
    let identity: Identity = serde_json::from_value(value).expect("row decodes");
    assert_eq!(identity.role(), None);
    assert!(!identity.is_admin());
}

#[rstest]
fn rejects_row_with_invalid_id() {
    let value = json!({ "id": "x", "name": "Ada", "email": "ada@example.com" });
    let result: Result<Identity, _> = serde_json::from_value(value);
    assert!(result.is_err());
}

#[rstest]
fn serialises_to_row_shape(admin: Identity) {
    let value = serde_json::to_value(&admin).expect("identity serialises");
    assert_eq!(
        value,
        json!({
            "id": VALID_ID,
            "name": "Ada Lovelace",
            "email": "ada@example.com",
            "role": "admin"
        })
    );
}
