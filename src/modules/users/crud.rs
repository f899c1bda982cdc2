use chrono::Utc;
use sqlx::{MySql, Pool, QueryBuilder};

use crate::modules::auth::model::User;

pub struct ProfileCrud {
    pool: Pool<MySql>,
}

impl ProfileCrud {
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn email_taken_by_other(
        &self,
        email: &str,
        user_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let result: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM users WHERE email = ? AND id != ?")
                .bind(email)
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(result.0 > 0)
    }

    /// Applies only the provided columns.
    pub async fn update(
        &self,
        id: &str,
        name: Option<&str>,
        email: Option<&str>,
        password_hash: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        let mut qb = QueryBuilder::<MySql>::new("UPDATE users SET updated_at = ");
        qb.push_bind(Utc::now());

        if let Some(name) = name {
            qb.push(", name = ");
            qb.push_bind(name.to_string());
        }
        if let Some(email) = email {
            qb.push(", email = ");
            qb.push_bind(email.to_string());
        }
        if let Some(hash) = password_hash {
            qb.push(", password_hash = ");
            qb.push_bind(hash.to_string());
        }

        qb.push(" WHERE id = ");
        qb.push_bind(id.to_string());

        qb.build().execute(&self.pool).await?;
        Ok(())
    }
}
