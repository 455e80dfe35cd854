use super::tally_event::EventProperties;
use super::tally_user::TallyUser;
use crate::TallyErr;

const MAX_EVENT_NAME_LENGTH: usize = 255;

pub fn validate_event_name(name: &str) -> Result<(), TallyErr> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(TallyErr::InvalidEvent(
            "event name must not be blank".to_string(),
        ));
    }

    if trimmed.chars().count() > MAX_EVENT_NAME_LENGTH {
        return Err(TallyErr::InvalidEvent(format!(
            "event name exceeds {MAX_EVENT_NAME_LENGTH} characters"
        )));
    }

    Ok(())
}

pub fn validate_properties(properties: Option<&EventProperties>) -> Result<(), TallyErr> {
    let properties = match properties {
        Some(p) => p,
        None => return Ok(()),
    };

    if properties.keys().any(|k| k.trim().is_empty()) {
        return Err(TallyErr::InvalidEvent(
            "property keys must not be blank".to_string(),
        ));
    }

    Ok(())
}

pub fn validate_event(name: &str, properties: Option<&EventProperties>) -> Result<(), TallyErr> {
    validate_event_name(name)?;
    validate_properties(properties)
}

pub fn validate_user(user: &TallyUser) -> Result<(), TallyErr> {
    if user.user_id.trim().is_empty() {
        return Err(TallyErr::InvalidUser("userID must not be blank".to_string()));
    }

    if let Some(email) = &user.email {
        if !email.contains('@') {
            return Err(TallyErr::InvalidUser(format!("malformed email '{email}'")));
        }
    }

    if let Some(traits) = &user.traits {
        if traits.keys().any(|k| k.trim().is_empty()) {
            return Err(TallyErr::InvalidUser("trait keys must not be blank".to_string()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn test_blank_names_are_rejected() {
        assert!(validate_event_name("").is_err());
        assert!(validate_event_name("   ").is_err());
        assert!(validate_event_name(" signup ").is_ok());
    }

    #[test]
    fn test_long_names_are_rejected() {
        let name = "x".repeat(MAX_EVENT_NAME_LENGTH + 1);
        assert!(matches!(
            validate_event_name(&name),
            Err(TallyErr::InvalidEvent(_))
        ));
    }

    #[test]
    fn test_blank_property_keys_are_rejected() {
        let props = HashMap::from([(" ".to_string(), json!(1))]);
        assert!(validate_event("e1", Some(&props)).is_err());

        let props = HashMap::from([("plan".to_string(), json!({"tier": "pro"}))]);
        assert!(validate_event("e1", Some(&props)).is_ok());
    }

    #[test]
    fn test_user_validation() {
        assert!(validate_user(&TallyUser::with_user_id("a-user")).is_ok());
        assert!(validate_user(&TallyUser::with_user_id(" ")).is_err());
        assert!(validate_user(&TallyUser::with_user_id("a-user").email("nope")).is_err());
        assert!(validate_user(&TallyUser::with_user_id("a-user").email("a@b.co")).is_ok());
        assert!(validate_user(&TallyUser::with_user_id("a-user").trait_value("", 1)).is_err());
    }
}
