//! Read-only listings and undo package export.

use crate::orchestrator::connect;
use cmsweep_core::undo::{self, UndoPackageListing};
use cmsweep_core::{
    Error, PublishTransactionData, PublishTransactionsFilter, QueueData, RepositoryData, Result,
};
use cmsweep_service::{ByteStream, Session};
use futures::StreamExt;
use tokio::io::{AsyncWrite, AsyncWriteExt};

const PUBLISH_TRANSACTION_TYPE: &str = "PublishTransaction";

/// Filter for listing publish transactions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishTransactionQuery {
    pub publisher_host: Option<String>,
    pub is_completed: Option<bool>,
}

/// Undo packages that still have their content, in metadata order.
pub async fn undo_packages(session: &Session) -> Result<UndoPackageListing> {
    let service = connect(session).await?;
    let entries = service.read_all_application_data(None).await?;
    let listing = undo::enumerate(&entries);
    tracing::debug!(
        packages = listing.packages.len(),
        skipped = listing.skipped.len(),
        "Listed undo packages"
    );
    Ok(listing)
}

/// A single publish transaction. Fails if `id` names another kind of item.
pub async fn publish_transaction(session: &Session, id: &str) -> Result<PublishTransactionData> {
    let service = connect(session).await?;
    let item = service.read(id).await?;
    if item.item_type != PUBLISH_TRANSACTION_TYPE {
        return Err(Error::validation(format!(
            "{id} is a {}, not a publish transaction",
            item.item_type
        )));
    }
    let value = serde_json::to_value(&item).map_err(|e| Error::RemoteService {
        code: "InvalidResponse".to_string(),
        message: e.to_string(),
    })?;
    serde_json::from_value(value).map_err(|e| Error::RemoteService {
        code: "InvalidResponse".to_string(),
        message: format!("publish transaction {id}: {e}"),
    })
}

/// Publish transactions, optionally filtered by publisher host and completion.
pub async fn publish_transactions(
    session: &Session,
    query: &PublishTransactionQuery,
) -> Result<Vec<PublishTransactionData>> {
    let service = connect(session).await?;
    let filter = PublishTransactionsFilter {
        end_date: None,
        publisher_host: query.publisher_host.clone(),
        is_completed: query.is_completed,
    };
    Ok(service.list_publish_transactions(&filter).await?)
}

pub async fn queues(session: &Session) -> Result<Vec<QueueData>> {
    let service = connect(session).await?;
    Ok(service.list_queues().await?)
}

/// All repositories, or the given ones read one by one.
pub async fn repositories(session: &Session, ids: &[String]) -> Result<Vec<RepositoryData>> {
    let service = connect(session).await?;
    if ids.is_empty() {
        return Ok(service.list_repositories().await?);
    }
    let mut repositories = Vec::with_capacity(ids.len());
    for id in ids {
        let item = service.read(id).await?;
        repositories.push(RepositoryData {
            id: item.id,
            title: item.title.unwrap_or_default(),
        });
    }
    Ok(repositories)
}

pub async fn application_ids(session: &Session) -> Result<Vec<String>> {
    let service = connect(session).await?;
    Ok(service.application_ids().await?)
}

/// Check that `package_id` is a listed undo package and open its content stream.
///
/// Nothing is written anywhere until the stream is consumed.
pub async fn open_undo_package(session: &Session, package_id: &str) -> Result<ByteStream> {
    let listing = undo_packages(session).await?;
    if !listing
        .packages
        .iter()
        .any(|package| package.package_id == package_id)
    {
        return Err(Error::validation(format!("no undo package {package_id}")));
    }

    let download = session.download().await?;
    Ok(download.download_application_data(package_id).await?)
}

/// Copy an opened content stream into `writer`. Returns the bytes written.
pub async fn copy_content<W>(mut content: ByteStream, writer: &mut W) -> Result<u64>
where
    W: AsyncWrite + Unpin,
{
    let mut written = 0u64;
    while let Some(chunk) = content.next().await {
        let chunk = chunk?;
        writer.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    writer.flush().await?;
    Ok(written)
}

/// Stream the content of an undo package into `writer`. Returns the bytes written.
pub async fn export_undo_package<W>(session: &Session, package_id: &str, writer: &mut W) -> Result<u64>
where
    W: AsyncWrite + Unpin,
{
    let content = open_undo_package(session, package_id).await?;
    let written = copy_content(content, writer).await?;
    tracing::info!(package_id, bytes = written, "Exported undo package");
    Ok(written)
}
