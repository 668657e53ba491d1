//! Smoke Test: the API answers and reports unknown pets

use plancheck_harness::{Case, CaseContext, HarnessResult, Suite};

use super::{PetStoreApi, PET_NOT_FOUND};

pub const SUITE: &str = "Smoke Test";

pub fn suite(api: &PetStoreApi) -> Suite {
    Suite::new(SUITE).case(
        Case::with_state("Health Check - Get Pet by Invalid ID", api.clone(), health_check)
            .tag("api")
            .tag("smoke"),
    )
}

async fn health_check(ctx: CaseContext, api: PetStoreApi) -> HarnessResult<()> {
    // Fresh ids are never created by any case, so this one cannot exist
    let response = api.get(&ctx, ctx.fresh_id()).await?;
    ctx.expect_status(&response).to_equal(&404)?;

    let body = response.json()?;
    ctx.expect("body", &body).to_have_property("message")?;
    ctx.expect("message", &body["message"]).to_contain(PET_NOT_FOUND)
}
