//! Gift listing command handler

use crate::config::Config;
use crate::db::Store;

pub async fn cmd_list_gifts(config: &Config) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let gifts = store.list_gifts().await?;

    if gifts.is_empty() {
        println!("The wishlist is empty.");
        return Ok(());
    }

    println!("Gifts ({} total)", gifts.len());
    println!("{:-<70}", "");

    for gift in gifts {
        let status = gift
            .reserved_by
            .as_deref()
            .map_or_else(|| "available".to_string(), |name| format!("reserved by {name}"));

        println!("#{} {} [{}]", gift.id, gift.title, gift.price);
        println!("  Added by: {} | {}", gift.owner_username, status);
        if let Some(comments) = &gift.comments {
            println!("  Note: {comments}");
        }
    }

    Ok(())
}
