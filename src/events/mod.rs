pub mod channel_bridge;

use std::sync::Arc;

use clokwerk::{AsyncScheduler, TimeUnits};
use serenity::prelude::Context;

use crate::database::Database;
use crate::events::channel_bridge::process_pending_requests;

/// Wire up the fixed-interval jobs. The channel-info bridge runs
/// independently of any command event.
pub fn setup_schedulers(scheduler: &mut AsyncScheduler, ctx: Context, db: Arc<Database>) {
    scheduler.every(2.seconds()).run(move || {
        let ctx = ctx.clone();
        let db = db.clone();
        async move {
            process_pending_requests(&ctx, &db).await;
        }
    });
}
