use user_directory::models::{CreateUserInput, Enrichment, Sex, User};
use user_directory::repositories::{InMemoryUserStore, UserStore};

/// Seeds users straight into the store, bypassing enrichment
pub struct Factory<'a> {
    store: &'a InMemoryUserStore,
}

impl<'a> Factory<'a> {
    pub fn new(store: &'a InMemoryUserStore) -> Self {
        Self { store }
    }

    pub async fn create_user(&self, name: &str, surname: &str) -> User {
        self.create_user_with(name, surname, Enrichment::default())
            .await
    }

    pub async fn create_user_with(
        &self,
        name: &str,
        surname: &str,
        enrichment: Enrichment,
    ) -> User {
        let input = CreateUserInput::new(name.to_string(), surname.to_string(), None)
            .with_enrichment(enrichment);

        self.store
            .create_user(&input)
            .await
            .expect("Failed to create test user")
    }

    /// Three users with varied attributes, in insertion order
    pub async fn seed_directory(&self) -> Vec<User> {
        vec![
            self.create_user_with(
                "Oliver",
                "Smith",
                Enrichment {
                    age: Some(31),
                    nationality: Some("GB".to_string()),
                    sex: Some(Sex::Male),
                },
            )
            .await,
            self.create_user_with(
                "Olivia",
                "Brown",
                Enrichment {
                    age: Some(0),
                    nationality: Some("IE".to_string()),
                    sex: Some(Sex::Female),
                },
            )
            .await,
            self.create_user("Ivan", "Petrov").await,
        ]
    }
}
