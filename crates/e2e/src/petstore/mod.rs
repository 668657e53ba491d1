//! Pet-store REST API suites
//!
//! Every case that creates a pet registers its deletion with
//! [`PetStoreApi::track`] before the create request is sent, so the remote
//! store is left clean whichever branch the case takes.

use plancheck_harness::{CaseContext, HarnessError, HarnessResult, HttpResponse};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

pub mod crud;
pub mod negative;
pub mod smoke;

/// Photo URL carried by the canonical fixture
pub const DOG_PHOTO: &str = "https://example.com/dog.jpg";

/// Message the store returns for unknown ids
pub const PET_NOT_FOUND: &str = "Pet not found";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PetStatus {
    Available,
    Pending,
    Sold,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

/// Wire shape of a pet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pet {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PetStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub photo_urls: Vec<String>,
}

impl Pet {
    /// "Fluffy", an available dog tagged friendly
    pub fn fluffy(id: i64) -> Self {
        Self {
            id,
            name: Some("Fluffy".into()),
            status: Some(PetStatus::Available),
            category: Some(dogs()),
            tags: vec![Tag {
                id: 1,
                name: "friendly".into(),
            }],
            photo_urls: vec![DOG_PHOTO.into()],
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_status(mut self, status: PetStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Drop tags and photos
    pub fn bare(mut self) -> Self {
        self.tags.clear();
        self.photo_urls.clear();
        self
    }
}

pub fn dogs() -> Category {
    Category {
        id: 1,
        name: "Dogs".into(),
    }
}

/// URLs of the pet resource
#[derive(Debug, Clone)]
pub struct PetStoreApi {
    base: Arc<str>,
}

impl PetStoreApi {
    pub fn new(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').into(),
        }
    }

    /// `POST`/`PUT` target
    pub fn pets(&self) -> String {
        format!("{}/pet", self.base)
    }

    pub fn pet(&self, id: impl std::fmt::Display) -> String {
        format!("{}/pet/{}", self.base, id)
    }

    pub async fn create(&self, ctx: &CaseContext, pet: &Pet) -> HarnessResult<HttpResponse> {
        ctx.post(&self.pets(), pet).await
    }

    pub async fn update(&self, ctx: &CaseContext, pet: &Pet) -> HarnessResult<HttpResponse> {
        ctx.put(&self.pets(), pet).await
    }

    pub async fn get(&self, ctx: &CaseContext, id: impl std::fmt::Display) -> HarnessResult<HttpResponse> {
        ctx.get(&self.pet(id)).await
    }

    pub async fn delete(&self, ctx: &CaseContext, id: i64) -> HarnessResult<HttpResponse> {
        ctx.delete(&self.pet(id)).await
    }

    /// Register deletion of pet `id` as a case cleanup.
    ///
    /// The cleanup accepts 404 so it can be registered before the pet
    /// exists. Call [`PetFixture::release`] once the case deleted the pet
    /// itself.
    pub fn track(&self, ctx: &CaseContext, id: i64) -> PetFixture {
        let released = Arc::new(AtomicBool::new(false));
        let flag = released.clone();
        let url = self.pet(id);

        ctx.defer_cleanup(format!("delete pet {id}"), move |ctx| async move {
            if flag.load(Ordering::SeqCst) {
                debug!("Pet already deleted by the case: {}", url);
                return Ok(());
            }
            let response = ctx.delete(&url).await?;
            match response.status {
                200 | 404 => Ok(()),
                status => Err(HarnessError::collaborator(format!("DELETE {url} answered {status}"))),
            }
        });

        PetFixture { id, released }
    }
}

/// A pet whose deletion is owned by the case cleanup
#[derive(Debug)]
pub struct PetFixture {
    id: i64,
    released: Arc<AtomicBool>,
}

impl PetFixture {
    pub fn id(&self) -> i64 {
        self.id
    }

    /// The case removed the pet; skip the cleanup delete
    pub fn release(&self) {
        self.released.store(true, Ordering::SeqCst);
    }
}
