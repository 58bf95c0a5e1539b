use super::validators::{
    is_valid_avatar_url, is_valid_chat_name, is_valid_email, MIN_PASSWORD_LEN,
};
use super::{FieldErrors, FormModel};

/// Default upper bound on group size
pub const DEFAULT_MAX_GROUP_MEMBERS: usize = 50;

fn password_error(password: &str) -> Option<&'static str> {
    if password.is_empty() {
        Some("Password is required")
    } else if password.chars().count() < MIN_PASSWORD_LEN {
        Some("Password must be at least 6 characters")
    } else {
        None
    }
}

// ============= Login =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoginField {
    Identifier,
    Password,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoginForm {
    /// Username or email
    pub identifier: String,
    pub password: String,
}

impl FormModel for LoginForm {
    type Field = LoginField;

    fn fields() -> &'static [LoginField] {
        &[LoginField::Identifier, LoginField::Password]
    }

    fn set(&mut self, field: LoginField, value: String) {
        match field {
            LoginField::Identifier => self.identifier = value,
            LoginField::Password => self.password = value,
        }
    }

    fn get(&self, field: LoginField) -> String {
        match field {
            LoginField::Identifier => self.identifier.clone(),
            LoginField::Password => self.password.clone(),
        }
    }

    fn validate(&self) -> FieldErrors<LoginField> {
        let mut errors = FieldErrors::new();

        if self.identifier.is_empty() {
            errors.insert(
                LoginField::Identifier,
                "Username or Email is required".to_string(),
            );
        }
        if let Some(msg) = password_error(&self.password) {
            errors.insert(LoginField::Password, msg.to_string());
        }

        errors
    }
}

// ============= Register =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterField {
    Name,
    Username,
    Email,
    Password,
    ConfirmPassword,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegisterForm {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl FormModel for RegisterForm {
    type Field = RegisterField;

    fn fields() -> &'static [RegisterField] {
        &[
            RegisterField::Name,
            RegisterField::Username,
            RegisterField::Email,
            RegisterField::Password,
            RegisterField::ConfirmPassword,
        ]
    }

    fn set(&mut self, field: RegisterField, value: String) {
        match field {
            RegisterField::Name => self.name = value,
            RegisterField::Username => self.username = value,
            RegisterField::Email => self.email = value,
            RegisterField::Password => self.password = value,
            RegisterField::ConfirmPassword => self.confirm_password = value,
        }
    }

    fn get(&self, field: RegisterField) -> String {
        match field {
            RegisterField::Name => self.name.clone(),
            RegisterField::Username => self.username.clone(),
            RegisterField::Email => self.email.clone(),
            RegisterField::Password => self.password.clone(),
            RegisterField::ConfirmPassword => self.confirm_password.clone(),
        }
    }

    fn validate(&self) -> FieldErrors<RegisterField> {
        let mut errors = FieldErrors::new();

        if self.name.is_empty() {
            errors.insert(RegisterField::Name, "Full Name is required".to_string());
        } else if self.name.chars().count() < 2 {
            errors.insert(
                RegisterField::Name,
                "Name must be at least 2 characters".to_string(),
            );
        }

        if self.username.is_empty() {
            errors.insert(RegisterField::Username, "Username is required".to_string());
        } else if self.username.chars().count() < 3 {
            errors.insert(
                RegisterField::Username,
                "Username must be at least 3 characters".to_string(),
            );
        }

        if self.email.is_empty() {
            errors.insert(RegisterField::Email, "Email is required".to_string());
        } else if !is_valid_email(&self.email) {
            errors.insert(RegisterField::Email, "Email is invalid".to_string());
        }

        if let Some(msg) = password_error(&self.password) {
            errors.insert(RegisterField::Password, msg.to_string());
        }

        if self.password != self.confirm_password {
            errors.insert(
                RegisterField::ConfirmPassword,
                "Passwords do not match".to_string(),
            );
        }

        errors
    }
}

// ============= Profile =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileField {
    Name,
    Avatar,
}

/// Profile edit form. Empty fields are left unchanged on the server.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileForm {
    pub name: String,
    pub avatar: String,
}

impl ProfileForm {
    /// Build the partial update, skipping blank fields
    pub fn to_update(&self) -> crate::types::ProfileUpdate {
        let non_blank = |s: &str| {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        };
        crate::types::ProfileUpdate {
            name: non_blank(&self.name),
            avatar: non_blank(&self.avatar),
        }
    }
}

impl FormModel for ProfileForm {
    type Field = ProfileField;

    fn fields() -> &'static [ProfileField] {
        &[ProfileField::Name, ProfileField::Avatar]
    }

    fn set(&mut self, field: ProfileField, value: String) {
        match field {
            ProfileField::Name => self.name = value,
            ProfileField::Avatar => self.avatar = value,
        }
    }

    fn get(&self, field: ProfileField) -> String {
        match field {
            ProfileField::Name => self.name.clone(),
            ProfileField::Avatar => self.avatar.clone(),
        }
    }

    fn validate(&self) -> FieldErrors<ProfileField> {
        let mut errors = FieldErrors::new();
        let name = self.name.trim();
        let avatar = self.avatar.trim();

        if name.is_empty() && avatar.is_empty() {
            errors.insert(ProfileField::Name, "Nothing to update".to_string());
        }
        if !name.is_empty() && name.chars().count() < 2 {
            errors.insert(
                ProfileField::Name,
                "Name must be at least 2 characters".to_string(),
            );
        }
        if !avatar.is_empty() && !is_valid_avatar_url(avatar) {
            errors.insert(
                ProfileField::Avatar,
                "Avatar must be an http(s) or data URL".to_string(),
            );
        }

        errors
    }
}

// ============= Create Group =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CreateGroupField {
    Name,
    Description,
    MemberIds,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateGroupForm {
    pub name: String,
    pub description: String,
    pub member_ids: Vec<String>,
    pub max_members: usize,
}

impl Default for CreateGroupForm {
    fn default() -> Self {
        Self::with_max_members(DEFAULT_MAX_GROUP_MEMBERS)
    }
}

impl CreateGroupForm {
    pub fn with_max_members(max_members: usize) -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            member_ids: Vec::new(),
            max_members,
        }
    }

    pub fn description(&self) -> Option<String> {
        let description = self.description.trim();
        (!description.is_empty()).then(|| description.to_string())
    }
}

impl FormModel for CreateGroupForm {
    type Field = CreateGroupField;

    fn fields() -> &'static [CreateGroupField] {
        &[
            CreateGroupField::Name,
            CreateGroupField::Description,
            CreateGroupField::MemberIds,
        ]
    }

    /// Member ids are entered as a comma separated list
    fn set(&mut self, field: CreateGroupField, value: String) {
        match field {
            CreateGroupField::Name => self.name = value,
            CreateGroupField::Description => self.description = value,
            CreateGroupField::MemberIds => {
                self.member_ids = value
                    .split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(str::to_string)
                    .collect();
            }
        }
    }

    fn get(&self, field: CreateGroupField) -> String {
        match field {
            CreateGroupField::Name => self.name.clone(),
            CreateGroupField::Description => self.description.clone(),
            CreateGroupField::MemberIds => self.member_ids.join(","),
        }
    }

    fn validate(&self) -> FieldErrors<CreateGroupField> {
        let mut errors = FieldErrors::new();

        if !is_valid_chat_name(&self.name) {
            errors.insert(
                CreateGroupField::Name,
                "Group name must be 1 to 100 characters".to_string(),
            );
        }
        if self.member_ids.is_empty() {
            errors.insert(
                CreateGroupField::MemberIds,
                "Select at least one member".to_string(),
            );
        } else if self.member_ids.len() > self.max_members {
            errors.insert(
                CreateGroupField::MemberIds,
                format!("A group can have at most {} members", self.max_members),
            );
        }

        errors
    }
}
