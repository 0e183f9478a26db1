use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContactSubmission {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: String,
    pub created_at: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewContactSubmission {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: String,
}

impl NewContactSubmission {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.name.trim().is_empty() {
            return Err(anyhow::anyhow!("name is required"));
        }
        if !self.email.contains('@') {
            return Err(anyhow::anyhow!("invalid email: {}", self.email));
        }
        if self.message.trim().is_empty() {
            return Err(anyhow::anyhow!("message is required"));
        }
        Ok(())
    }
}
