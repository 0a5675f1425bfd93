use anyhow::Result;

use tally_core::service::TallyService;

use crate::sync_http::HttpSyncClient;

pub(crate) async fn cmd_sync_push(
    svc: &TallyService,
    url: &str,
    account: &str,
    json: bool,
) -> Result<()> {
    let client = HttpSyncClient::new(url);
    let snapshot = svc.export_snapshot()?;
    client.upsert_async(account, &snapshot).await?;

    if json {
        println!("{}", serde_json::json!({ "pushed": true, "account": account }));
    } else {
        println!("Snapshot pushed for {account}");
    }

    Ok(())
}

pub(crate) async fn cmd_sync_pull(
    svc: &mut TallyService,
    url: &str,
    account: &str,
    json: bool,
) -> Result<()> {
    let client = HttpSyncClient::new(url);
    let remote = client.fetch_async(account).await?;

    let merged = match remote {
        Some(snapshot) => {
            svc.merge_remote_snapshot(&snapshot)?;
            true
        }
        None => false,
    };

    if json {
        println!("{}", serde_json::json!({ "merged": merged, "account": account }));
    } else if merged {
        println!("Remote snapshot merged for {account}");
    } else {
        eprintln!("No remote snapshot for {account} yet. Push one with `tally sync push`.");
    }

    Ok(())
}
