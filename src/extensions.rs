use std::sync::Arc;

use serenity::{
    async_trait, client,
    model::application::interaction::application_command::{
        CommandDataOption, CommandDataOptionValue,
    },
    model::guild::PartialMember,
    model::user::User,
};

use crate::database::Database;

#[async_trait]
pub trait ClientContextExt {
    async fn get_db(&self) -> Arc<Database>;
}

pub trait CommandDataOptionExt {
    fn to_string(&self) -> Option<String>;
    fn to_i64(&self) -> Option<i64>;
    fn to_f64(&self) -> Option<f64>;
    fn to_user(&self) -> Option<(User, Option<PartialMember>)>;
}

pub trait CommandDataOptionVecExt {
    fn by_name(&self, name: &str) -> Option<&CommandDataOption>;
}

#[async_trait]
impl ClientContextExt for client::Context {
    async fn get_db(&self) -> Arc<Database> {
        self.data.read().await.get::<Database>().unwrap().clone()
    }
}

impl CommandDataOptionExt for CommandDataOption {
    fn to_string(&self) -> Option<String> {
        self.resolved.as_ref().and_then(|v| {
            if let CommandDataOptionValue::String(x) = v {
                Some(x.to_owned())
            } else {
                None
            }
        })
    }

    fn to_i64(&self) -> Option<i64> {
        self.resolved.as_ref().and_then(|v| {
            if let CommandDataOptionValue::Integer(x) = v {
                Some(x.to_owned())
            } else {
                None
            }
        })
    }

    fn to_f64(&self) -> Option<f64> {
        self.resolved.as_ref().and_then(|v| {
            if let CommandDataOptionValue::Number(x) = v {
                Some(x.to_owned())
            } else {
                None
            }
        })
    }

    fn to_user(&self) -> Option<(User, Option<PartialMember>)> {
        self.resolved.as_ref().and_then(|v| {
            if let CommandDataOptionValue::User(x, p) = v {
                Some((x.to_owned(), p.to_owned()))
            } else {
                None
            }
        })
    }
}

impl CommandDataOptionVecExt for Vec<CommandDataOption> {
    fn by_name(&self, name: &str) -> Option<&CommandDataOption> {
        self.iter().find(|x| x.name == name)
    }
}
