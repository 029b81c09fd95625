//! Foreign-key detection by naming convention.
//!
//! A column named `<Name>_ID` is taken to reference table `<Name>`. This is
//! a documented convention of the administered schema, not metadata read
//! from the server; keeping it as a pure function means it can be replaced
//! with true foreign-key introspection later without touching callers.

/// The table a column references under the `<Name>_ID` convention, if any.
pub fn referenced_table(column: &str) -> Option<&str> {
    column.strip_suffix("_ID").filter(|base| !base.is_empty())
}

/// True if `column` should get dropdown treatment: it is `_ID`-shaped and
/// is not the table's own identity column.
pub fn is_foreign_key(column: &str, identity_column: &str) -> bool {
    column != identity_column && referenced_table(column).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_id_suffix() {
        assert_eq!(referenced_table("Vehicle_ID"), Some("Vehicle"));
        assert_eq!(referenced_table("Service_Provider_ID"), Some("Service_Provider"));
    }

    #[test]
    fn non_fk_shapes_return_none() {
        assert_eq!(referenced_table("First_Name"), None);
        assert_eq!(referenced_table("_ID"), None);
        assert_eq!(referenced_table("id"), None);
        assert_eq!(referenced_table("Vehicle_Id"), None);
    }

    #[test]
    fn identity_column_is_not_a_foreign_key() {
        assert!(!is_foreign_key("Driver_ID", "Driver_ID"));
        assert!(is_foreign_key("Vehicle_ID", "Driver_ID"));
        assert!(!is_foreign_key("First_Name", "Driver_ID"));
    }
}
