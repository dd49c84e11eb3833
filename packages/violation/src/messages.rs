//! Advisory messages shown next to violation markers.

use rand::Rng;
use rand::seq::SliceRandom;

/// Sidewalk-riding warnings, one of which is attached to each marker.
pub const ADVISORY_MESSAGES: &[&str] = &[
    "歩道は歩行者優先です。自転車は車道の左側を走りましょう。",
    "この交差点は歩道を走る自転車が多い場所です。車道左側通行を心がけてください。",
    "やむを得ず歩道を通るときは、車道寄りを徐行しましょう。",
    "自転車は車両です。交差点では信号と一時停止を守りましょう。",
    "歩道走行は歩行者との接触事故につながります。周囲に注意してください。",
];

/// Picks one advisory message.
pub fn choose_message<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    ADVISORY_MESSAGES.choose(rng).copied().unwrap_or_default()
}
