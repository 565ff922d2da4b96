use anyhow::Result;

use crate::context::AppContext;

pub fn run(ctx: &AppContext) -> Result<()> {
    let username = ctx.session().username();
    let was_signed_in = ctx.session().is_authenticated();

    ctx.api.sign_out();
    ctx.persist_session()?;

    if was_signed_in {
        println!("Signed out {username}.");
    } else {
        println!("Not signed in.");
    }

    Ok(())
}
