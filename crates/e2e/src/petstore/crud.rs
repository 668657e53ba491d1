//! Pet CRUD Operations
//!
//! Each case creates its own pet under a fresh id, so the cases are
//! independent and may run concurrently.

use plancheck_harness::{Case, CaseContext, HarnessResult, Suite};
use serde_json::json;

use super::{Pet, PetStatus, PetStoreApi, DOG_PHOTO, PET_NOT_FOUND};

pub const SUITE: &str = "Pet CRUD Operations";

/// Fields a created pet must echo back unchanged
const ROUND_TRIP_FIELDS: [&str; 6] = ["id", "name", "status", "category", "tags", "photoUrls"];

pub fn suite(api: &PetStoreApi) -> Suite {
    Suite::new(SUITE)
        .case(Case::with_state("Create Pet", api.clone(), create_pet).tag("api"))
        .case(Case::with_state("Get Pet by ID", api.clone(), get_pet).tag("api"))
        .case(Case::with_state("Update Pet", api.clone(), update_pet).tag("api"))
        .case(Case::with_state("Delete Pet", api.clone(), delete_pet).tag("api"))
}

async fn create_pet(ctx: CaseContext, api: PetStoreApi) -> HarnessResult<()> {
    let pet = Pet::fluffy(ctx.fresh_id());
    api.track(&ctx, pet.id);

    let response = api.create(&ctx, &pet).await?;
    ctx.expect_status(&response).to_equal(&200)?;

    let body = response.json()?;
    ctx.expect("id", &body["id"]).to_equal(&pet.id)?;
    ctx.expect("name", &body["name"]).to_equal("Fluffy")?;
    ctx.expect("status", &body["status"]).to_equal(&PetStatus::Available)?;
    ctx.expect("category", &body["category"]).to_equal(&json!({"id": 1, "name": "Dogs"}))?;
    ctx.expect("tags", &body["tags"]).to_have_length(1)?;
    ctx.expect("tags[0]", &body["tags"][0]).to_equal(&json!({"id": 1, "name": "friendly"}))?;
    ctx.expect("photoUrls", &body["photoUrls"]).to_contain(DOG_PHOTO)
}

async fn get_pet(ctx: CaseContext, api: PetStoreApi) -> HarnessResult<()> {
    let pet = Pet::fluffy(ctx.fresh_id());
    api.track(&ctx, pet.id);
    let created = api.create(&ctx, &pet).await?;
    ctx.expect_status(&created).to_equal(&200)?;

    let response = api.get(&ctx, pet.id).await?;
    ctx.expect_status(&response).to_equal(&200)?;
    let body = response.json()?;
    ctx.expect("id", &body["id"]).to_equal(&pet.id)?;
    for field in ["name", "status", "category", "tags", "photoUrls"] {
        ctx.expect("body", &body).to_have_property(field)?;
    }

    // Round trip: every field of the payload comes back as sent
    let sent = serde_json::to_value(&pet)?;
    for field in ROUND_TRIP_FIELDS {
        ctx.expect(field, &body[field]).to_equal(&sent[field])?;
    }

    // Reading again does not change the pet
    let again = api.get(&ctx, pet.id).await?.json()?;
    ctx.expect("id", &again["id"]).to_equal(&body["id"])?;
    ctx.expect("name", &again["name"]).to_equal(&body["name"])
}

async fn update_pet(ctx: CaseContext, api: PetStoreApi) -> HarnessResult<()> {
    let pet = Pet::fluffy(ctx.fresh_id());
    api.track(&ctx, pet.id);
    let created = api.create(&ctx, &pet).await?;
    ctx.expect_status(&created).to_equal(&200)?;

    let updated = pet.clone().named("Fluffy Updated").with_status(PetStatus::Sold);
    let response = api.update(&ctx, &updated).await?;
    ctx.expect_status(&response).to_equal(&200)?;

    let body = response.json()?;
    ctx.expect("id", &body["id"]).to_equal(&pet.id)?;
    ctx.expect("name", &body["name"]).to_equal("Fluffy Updated")?;
    ctx.expect("status", &body["status"]).to_equal(&PetStatus::Sold)?;
    ctx.expect("category", &body["category"]).to_equal(&json!({"id": 1, "name": "Dogs"}))?;
    ctx.expect("tags", &body["tags"]).to_have_length(1)
}

async fn delete_pet(ctx: CaseContext, api: PetStoreApi) -> HarnessResult<()> {
    let pet = Pet::fluffy(ctx.fresh_id()).bare();
    let fixture = api.track(&ctx, pet.id);
    api.create(&ctx, &pet).await?;

    let before = api.get(&ctx, fixture.id()).await?;
    ctx.expect_status(&before).to_equal(&200)?;

    let deleted = api.delete(&ctx, fixture.id()).await?;
    ctx.expect_status(&deleted).to_equal(&200)?;
    fixture.release();

    // A pet that can still be read after a successful delete fails the case
    let after = api.get(&ctx, fixture.id()).await?;
    ctx.expect_status(&after).to_equal(&404)?;
    let body = after.json()?;
    ctx.expect("message", &body["message"]).to_contain(PET_NOT_FOUND)
}
