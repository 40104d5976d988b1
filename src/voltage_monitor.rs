//! バッテリー電圧監視
//!
//! 電源レール電圧のADC生値を固定小数点1次ローパスフィルタで平滑化します。
//! 制御ループより遅い間引き周期（スケジューラ側で管理）で更新されます。

use crate::config::BldcConfig;

/// 固定小数点1次ローパスフィルタ（1ステップ更新）
///
/// `state += (coef * ((input << 16) - state)) >> 16`
///
/// 状態は入力値を2^16倍した固定小数点。係数はfixdt(0,16,16)で、
/// 65536が1.0に相当します。乗算をシフトより先に行う順序を保つことで
/// 丸め挙動を既存実装と一致させています。
pub fn filt_low_pass32(input: u16, coef: u16, state: &mut i32) {
    let err = (((input as i32) << 16) as i64) - (*state as i64);
    *state = ((*state as i64) + ((coef as i64 * err) >> 16)) as i32;
}

/// バッテリー電圧モニタ
///
/// 公開値はフィルタ状態の上位ビット [ADC counts]。電圧[V]への換算は
/// テレメトリ側の責務です。
#[derive(Debug, Clone, Copy)]
pub struct BatteryMonitor {
    /// フィルタ内部状態（値 × 2^16）
    state: i32,
    /// 公開電圧 [ADC counts]
    voltage: i16,
    /// フィルタ係数 fixdt(0,16,16)
    coef: u16,
}

impl BatteryMonitor {
    /// 設定の校正ペアから初期電圧（4.00V/セル相当）でフィルタを初期化
    pub fn new(cfg: &BldcConfig) -> Self {
        let init = cfg.bat_voltage_init();
        Self {
            state: (init as i32) << 16,
            voltage: init,
            coef: cfg.bat_filt_coef,
        }
    }

    /// 生サンプルでフィルタを1ステップ更新し、公開電圧を更新
    pub fn update(&mut self, raw: u16) -> i16 {
        filt_low_pass32(raw, self.coef, &mut self.state);
        self.voltage = (self.state >> 16) as i16;
        self.voltage
    }

    /// 現在のフィルタ済み電圧 [ADC counts]
    pub fn voltage(&self) -> i16 {
        self.voltage
    }
}
