/// Tracks how far a connection got in identifying itself.
///
/// Validation is a placeholder: every non-empty value is accepted. The only
/// rule enforced here is which combination of values counts as a login, and
/// that a login, once reached, is never lost.
#[derive(Debug, Clone)]
pub struct AuthState {
    user_id: String,
    account: String,
    provided_password: bool,
    logged_in: bool,
    requires_account_and_password: bool,
}

/// A piece of identification the client still has to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credential {
    UserId,
    Account,
    Password,
}

impl Credential {
    pub fn label(&self) -> &'static str {
        match self {
            Credential::UserId => "user-id",
            Credential::Account => "account",
            Credential::Password => "password",
        }
    }
}

impl AuthState {
    pub fn new(requires_account_and_password: bool) -> Self {
        Self {
            user_id: String::new(),
            account: String::new(),
            provided_password: false,
            logged_in: false,
            requires_account_and_password,
        }
    }

    pub fn requires_account_and_password(&self) -> bool {
        self.requires_account_and_password
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn has_user_id(&self) -> bool {
        !self.user_id.is_empty()
    }

    pub fn has_account(&self) -> bool {
        !self.account.is_empty()
    }

    pub fn has_password(&self) -> bool {
        self.provided_password
    }

    /// The first user-id submitted sticks; later ones are ignored.
    pub fn submit_user_id(&mut self, user_id: &str) -> bool {
        if self.user_id.is_empty() {
            self.user_id = user_id.trim().to_string();
        }
        true
    }

    /// The first account submitted sticks; later ones are ignored.
    pub fn submit_account(&mut self, account: &str) -> bool {
        if self.account.is_empty() {
            self.account = account.trim().to_string();
        }
        true
    }

    pub fn submit_password(&mut self, _password: &str) -> bool {
        self.provided_password = true;
        true
    }

    pub fn is_logged_in(&mut self) -> bool {
        if self.logged_in {
            return true;
        }

        // Credentials may arrive in any order, so the full rule is re-checked each time.
        let satisfied = if self.requires_account_and_password {
            self.has_user_id() && self.has_account() && self.has_password()
        } else {
            self.has_user_id()
        };

        if satisfied {
            self.logged_in = true;
        }
        self.logged_in
    }

    /// Credentials still needed before `is_logged_in` can succeed.
    pub fn missing_credentials(&self) -> Vec<Credential> {
        if self.logged_in {
            return Vec::new();
        }

        let mut missing = Vec::new();
        if !self.has_user_id() {
            missing.push(Credential::UserId);
        }
        if self.requires_account_and_password {
            if !self.has_account() {
                missing.push(Credential::Account);
            }
            if !self.has_password() {
                missing.push(Credential::Password);
            }
        }
        missing
    }

    /// Human readable form of `missing_credentials`, e.g. `account and password`.
    pub fn describe_missing(&self) -> String {
        self.missing_credentials()
            .iter()
            .map(Credential::label)
            .collect::<Vec<_>>()
            .join(" and ")
    }
}
