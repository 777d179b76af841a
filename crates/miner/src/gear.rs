//! Tool management — finding, equipping, and verifying extraction tools.

use prospector_config::AppConfig;
use prospector_core::{GameHost, GraphicId, Hand, HostError, ItemSnapshot, Serial, SessionError};
use tracing::{debug, warn};

/// The extraction tool currently in either hand, if any.
pub(crate) async fn wielded_tool(
    host: &dyn GameHost,
    tool_graphics: &[GraphicId],
) -> Result<Option<ItemSnapshot>, HostError> {
    for hand in [Hand::Left, Hand::Right] {
        if let Some(item) = host.item_in_hand(hand).await?
            && tool_graphics.contains(&item.graphic)
        {
            return Ok(Some(item));
        }
    }
    Ok(None)
}

/// Make sure an extraction tool is wielded, pulling a spare from the
/// backpack when the hands are empty or hold something else.
///
/// Running out of tools entirely is fatal to the session; there is nothing
/// left to gather with.
pub(crate) async fn ensure_tool(
    host: &dyn GameHost,
    config: &AppConfig,
) -> Result<Serial, SessionError> {
    let tool_graphics = &config.mining.tool_graphics;

    if let Some(item) = wielded_tool(host, tool_graphics).await? {
        return Ok(item.serial);
    }

    let status = host.player_status().await?;
    let pack = host.container_items(status.backpack).await?;
    let Some(spare) = pack.iter().find(|i| tool_graphics.contains(&i.graphic)) else {
        return Err(SessionError::NoUsableTool);
    };

    debug!(serial = spare.serial, "Equipping spare tool");
    host.equip(spare.serial).await?;
    tokio::time::sleep(config.timing.equip_settle()).await;

    // Equip is another fire-and-forget host action; confirm it landed.
    match wielded_tool(host, tool_graphics).await? {
        Some(item) => Ok(item.serial),
        None => {
            warn!(serial = spare.serial, "Tool equip did not take effect");
            Err(SessionError::NoUsableTool)
        }
    }
}

/// The survey tool from the backpack, if one is carried.
pub(crate) async fn survey_tool(
    host: &dyn GameHost,
    config: &AppConfig,
) -> Result<Option<ItemSnapshot>, HostError> {
    let status = host.player_status().await?;
    let pack = host.container_items(status.backpack).await?;
    Ok(pack
        .into_iter()
        .find(|i| i.graphic == config.mining.prospect_tool))
}
