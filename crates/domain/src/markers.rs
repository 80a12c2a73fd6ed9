//! On-screen text markers the bot reacts to.
//!
//! These are the literal strings the game renders; recognition results are
//! matched against them by substring.

/// Main menu entry button.
pub const DIVE_INTO_ABYSS: &str = "坠入深渊";
/// Main menu region title.
pub const LAND_OF_PARADISE: &str = "乐土之国";
pub const START_EXPLORATION: &str = "开始探索";
pub const CONTINUE_EXPLORATION: &str = "继续探索";

/// Overlays dismissed by clicking the close button.
pub const CLOSE_OVERLAY_MARKERS: [&str; 7] = [
    "点击空白",
    "探索完成",
    "探索成功",
    "激活套装",
    "获得烛芯",
    "获得遗物",
    "点击任意",
];

pub const REVIVE: &str = "复苏";
pub const RELIC_OBTAINED: &str = "获得遗物";
pub const EXPLORE_DETAILS: &str = "探索详情";
pub const LAST_EXPLORED: &str = "上次探索过深渊";
pub const SELECT_CANDLE: &str = "选择烛芯";

/// Navigation prompts.
pub const NAVIGATION_MARKERS: [&str; 2] = ["前往", "下一层"];

pub const BATTLE_MARKERS: [&str; 2] = ["战斗", "驱散幽影"];

/// Text that means a menu or selection screen is up, so visible hostiles
/// are not engageable.
pub const NON_COMBAT_SCREEN_MARKERS: [&str; 4] = ["坠入深渊", "开始探索", "探索详情", "选择"];

/// Main menu text checked by the late, position-aware rule.
pub const MAIN_MENU_MARKERS: [&str; 3] = ["坠入深渊", "开始探索", "乐土之国"];

// Selection screens
pub const SELECT: &str = "选择";
pub const CONFIRM: &str = "确定";
pub const ABANDON: &str = "放弃";
pub const EXIT: &str = "退出";
pub const BUFF_TRAIL: &str = "行迹";
pub const BUFF_OBTAIN: &str = "获取";
pub const BUFF_RANGED_WEAPON: &str = "远程武器";
pub const CANDLE_SHADOW_BUTTERFLY: &str = "噬影蝶";
pub const CANDLE_SEA_MOON: &str = "浮海月";

// Explore details tabs, in click priority order
pub const EXPLORE_DETAIL_TABS: [&[&str]; 5] = [
    &["烛芯"],
    &["余烬"],
    &["遗物"],
    &["结束", "炮台轰击", "开始游戏"],
    &["获得"],
];
