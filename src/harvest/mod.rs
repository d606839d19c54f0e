//! Retrieval of time entries from Harvest. Only the small part of the v2 REST API needed for
//! reports is covered: account lookup, the current user and time entries.

pub mod api;

use std::{future::Future, time::Duration};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use futures::{stream, FutureExt, Stream, TryStreamExt};
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::{entities::TimeEntry, utils::clock::Clock};

use self::api::{Account, AccountsResponse, TimeEntriesPage, User};

pub const TOKEN_VARIABLE: &str = "HARVEST_DEVELOPER_TOKEN";

const ACCOUNTS_URL: &str = "https://id.getharvest.com/api/v2/accounts";
const API_URL: &str = "https://api.harvestapp.com/v2";
const ACCOUNT_HEADER: &str = "Harvest-Account-Id";
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Harvest allows 100 requests per 15 seconds.
pub const PAGE_DELAY: Duration = Duration::from_millis(100);

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "Must set environment variable {}, see https://id.getharvest.com/developers to get one",
        TOKEN_VARIABLE
    )]
    MissingToken,
    #[error("Empty accounts package")]
    NoAccounts,
    #[error("Found {0} accounts, only a single account is supported")]
    MultipleAccounts(usize),
}

/// Accepts the raw value of [TOKEN_VARIABLE].
pub fn token_from(value: Option<String>) -> Result<String, ConfigError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::MissingToken)
}

/// Source of time entries for a report.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TimeEntrySource: Send + Sync {
    /// Every entry spent between `from` and `to`, both inclusive.
    async fn time_entries(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<TimeEntry>>;
}

/// Only tokens with access to exactly one account are supported.
pub fn select_account(accounts: &[Account]) -> Result<Account, ConfigError> {
    match accounts {
        [] => Err(ConfigError::NoAccounts),
        [account] => Ok(account.clone()),
        accounts => Err(ConfigError::MultipleAccounts(accounts.len())),
    }
}

/// Follows `next_page` from page 1 until a page has none. `fetch` is only called once the
/// previous page arrived, and every page after the first waits [PAGE_DELAY] on `clock` first.
fn paged<'a, F, Fut>(
    clock: &'a dyn Clock,
    fetch: F,
) -> impl Stream<Item = Result<Vec<TimeEntry>>> + 'a
where
    F: Fn(u32) -> Fut + 'a,
    Fut: Future<Output = Result<TimeEntriesPage>> + 'a,
{
    stream::try_unfold((Some(1u32), true), move |(page, first)| {
        let request = page.map(&fetch);
        async move {
            let (Some(page), Some(request)) = (page, request) else {
                return anyhow::Ok(None);
            };
            if !first {
                clock.sleep(PAGE_DELAY).await;
            }

            let response = request.await?;
            debug!(
                "Page {page} has {} entries, next {:?}",
                response.time_entries.len(),
                response.next_page
            );

            let entries = response
                .time_entries
                .into_iter()
                .map(TimeEntry::from)
                .collect::<Vec<_>>();
            anyhow::Ok(Some((entries, (response.next_page, false))))
        }
    })
}

async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T> {
    let response = request.send().await?.error_for_status()?;
    Ok(response.json::<T>().await?)
}

pub struct HarvestClient {
    http: reqwest::Client,
    token: String,
    account: Account,
    user: User,
    clock: Box<dyn Clock>,
}

impl HarvestClient {
    /// Resolves the account and user the token belongs to.
    #[instrument(skip_all)]
    pub async fn connect(token: String, clock: Box<dyn Clock>) -> Result<Self> {
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;

        let accounts: AccountsResponse = send_json(http.get(ACCOUNTS_URL).bearer_auth(&token))
            .await
            .context("Failed to list accounts")?;
        let account = select_account(&accounts.accounts)?;
        debug!("Using account {}", account.id);

        let user: User = send_json(
            http.get(format!("{API_URL}/users/me"))
                .bearer_auth(&token)
                .header(ACCOUNT_HEADER, account.id.to_string()),
        )
        .await
        .context("Failed to retrieve current user")?;

        Ok(Self {
            http,
            token,
            account,
            user,
            clock,
        })
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    fn api_get(&self, path: &str) -> RequestBuilder {
        self.http
            .get(format!("{API_URL}/{path}"))
            .bearer_auth(&self.token)
            .header(ACCOUNT_HEADER, self.account.id.to_string())
    }

    /// Pages of the current user's entries.
    fn pages(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> impl Stream<Item = Result<Vec<TimeEntry>>> + '_ {
        paged(self.clock.as_ref(), move |page| {
            send_json::<TimeEntriesPage>(self.api_get("time_entries").query(&[
                ("user_id", self.user.id.to_string()),
                ("from", from.format("%Y-%m-%d").to_string()),
                ("to", to.format("%Y-%m-%d").to_string()),
                ("page", page.to_string()),
            ]))
            .map(move |v| {
                v.with_context(|| format!("Failed to retrieve page {page} of time entries"))
            })
        })
    }
}

#[async_trait]
impl TimeEntrySource for HarvestClient {
    #[instrument(skip(self))]
    async fn time_entries(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<TimeEntry>> {
        self.pages(from, to).try_concat().await
    }
}
