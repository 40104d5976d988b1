//! 電流センサーオフセットのキャリブレーション
//!
//! 起動直後の無トルク状態で6チャネル分の生サンプルを規定数だけ積算し、
//! 定常オフセットを求めます。積算中にどちらかのモーターの回転を検出
//! した場合は積算を最初からやり直します（車体が転がっている間の
//! キャリブレーションを防ぐ自己修正。エラーとしては扱いません）。

use crate::fmt::*;
use crate::hardware::AdcBuffer;

/// キャリブレーション完了後に確定する6チャネルのオフセット [ADC counts]
///
/// 制御フェーズ中は不変。再計算はキャリブレーションの明示的な
/// 再スタートでのみ行われます。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdcOffsets {
    pub left_pha_a: u16,
    pub left_pha_b: u16,
    pub right_pha_b: u16,
    pub right_pha_c: u16,
    pub left_dc: u16,
    pub right_dc: u16,
}

/// 1tick分の積算結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationStep {
    /// 積算継続中
    Sampling,
    /// 規定数に到達、オフセット確定
    Done(AdcOffsets),
}

/// オフセット積算ステートマシン
///
/// `update()`を毎tick呼び出し、`Done`が返った時点で制御フェーズへ
/// 切り替えます。静止基準位置はスタート時のホール復号値です。
#[derive(Debug, Clone, Copy)]
pub struct AdcCalibration {
    /// スタート以降に処理したtick数
    sample_count: u32,
    sum_left_pha_a: u32,
    sum_left_pha_b: u32,
    sum_right_pha_b: u32,
    sum_right_pha_c: u32,
    sum_left_dc: u32,
    sum_right_dc: u32,
    /// 静止基準位置（左）
    rest_left: u8,
    /// 静止基準位置（右）
    rest_right: u8,
}

impl AdcCalibration {
    /// 現在のホール復号値を静止基準として積算を開始
    pub fn start(left_code: u8, right_code: u8) -> Self {
        Self {
            sample_count: 0,
            sum_left_pha_a: 0,
            sum_left_pha_b: 0,
            sum_right_pha_b: 0,
            sum_right_pha_c: 0,
            sum_left_dc: 0,
            sum_right_dc: 0,
            rest_left: left_code,
            rest_right: right_code,
        }
    }

    /// カウンタと積算値をゼロに戻し、静止基準を取り直す
    pub fn restart(&mut self, left_code: u8, right_code: u8) {
        *self = Self::start(left_code, right_code);
    }

    /// 1tick分の処理
    ///
    /// 回転検出時はその場で再スタートし、同じtickで積算を続行します
    /// （再スタート直後の1サンプル分の余分な積算は既存実装と同じ挙動。
    /// 静止したままの1回のランではちょうど`samples`個を積算して
    /// `samples`で割るため、一定入力なら除算は誤差なしになります）。
    pub fn update(
        &mut self,
        adc: &AdcBuffer,
        left_code: u8,
        right_code: u8,
        samples: u32,
    ) -> CalibrationStep {
        self.sample_count += 1;

        // 回転していたら積算は無効、取り直し
        if left_code != self.rest_left || right_code != self.rest_right {
            debug!("motion during ADC calibration, restarting");
            self.restart(left_code, right_code);
        }

        if self.sample_count < samples {
            self.accumulate(adc);
            CalibrationStep::Sampling
        } else {
            // 最後の1回を積算してから平均を確定
            self.accumulate(adc);
            CalibrationStep::Done(AdcOffsets {
                left_pha_a: (self.sum_left_pha_a / samples) as u16,
                left_pha_b: (self.sum_left_pha_b / samples) as u16,
                right_pha_b: (self.sum_right_pha_b / samples) as u16,
                right_pha_c: (self.sum_right_pha_c / samples) as u16,
                left_dc: (self.sum_left_dc / samples) as u16,
                right_dc: (self.sum_right_dc / samples) as u16,
            })
        }
    }

    fn accumulate(&mut self, adc: &AdcBuffer) {
        self.sum_left_pha_a += adc.left_pha_a as u32;
        self.sum_left_pha_b += adc.left_pha_b as u32;
        self.sum_right_pha_b += adc.right_pha_b as u32;
        self.sum_right_pha_c += adc.right_pha_c as u32;
        self.sum_left_dc += adc.left_dc as u32;
        self.sum_right_dc += adc.right_dc as u32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const N: u32 = 16;

    fn constant_adc(v: u16) -> AdcBuffer {
        AdcBuffer {
            left_pha_a: v,
            left_pha_b: v,
            right_pha_b: v,
            right_pha_c: v,
            left_dc: v,
            right_dc: v,
            batt: 0,
            temp: 0,
        }
    }

    #[test]
    fn test_constant_input_yields_exact_offsets() {
        let adc = constant_adc(2047);
        let mut cal = AdcCalibration::start(3, 3);
        // N-1 tickは積算のみ
        for _ in 0..N - 1 {
            assert_eq!(cal.update(&adc, 3, 3, N), CalibrationStep::Sampling);
        }
        // N tick目で確定、除算は誤差なし
        match cal.update(&adc, 3, 3, N) {
            CalibrationStep::Done(offsets) => {
                assert_eq!(offsets.left_pha_a, 2047);
                assert_eq!(offsets.left_pha_b, 2047);
                assert_eq!(offsets.right_pha_b, 2047);
                assert_eq!(offsets.right_pha_c, 2047);
                assert_eq!(offsets.left_dc, 2047);
                assert_eq!(offsets.right_dc, 2047);
            }
            CalibrationStep::Sampling => panic!("calibration did not finish on tick N"),
        }
    }

    #[test]
    fn test_motion_restarts_accumulation() {
        let adc = constant_adc(1000);
        let mut cal = AdcCalibration::start(3, 3);
        for _ in 0..N / 2 {
            cal.update(&adc, 3, 3, N);
        }
        // 左モーターが動いた -> 最初からやり直し
        cal.update(&adc, 4, 3, N);
        assert_eq!(cal.rest_left, 4);
        // 再スタートのtick自身も1サンプル積算している
        assert_eq!(cal.sample_count, 0);
        assert_eq!(cal.sum_left_dc, 1000);
        // 以降N-1 tickで完了（再スタートtickの分を含めN+1サンプル/除数N）
        for _ in 0..N - 1 {
            assert_eq!(cal.update(&adc, 4, 3, N), CalibrationStep::Sampling);
        }
        match cal.update(&adc, 4, 3, N) {
            CalibrationStep::Done(offsets) => {
                // 再スタートtickの1サンプルを含むためN+1サンプル/除数N
                assert_eq!(offsets.left_dc as u32, (N + 1) * 1000 / N);
            }
            CalibrationStep::Sampling => panic!("calibration did not finish after restart"),
        }
    }

    #[test]
    fn test_right_motor_motion_also_restarts() {
        let adc = constant_adc(500);
        let mut cal = AdcCalibration::start(2, 5);
        cal.update(&adc, 2, 5, N);
        cal.update(&adc, 2, 6, N);
        assert_eq!(cal.rest_right, 6);
        assert_eq!(cal.sample_count, 0);
    }

    #[test]
    fn test_averages_varying_input() {
        // 交互に999/1001を与えると平均1000
        let mut cal = AdcCalibration::start(0, 0);
        for i in 0..N {
            let v = if i % 2 == 0 { 999 } else { 1001 };
            let step = cal.update(&constant_adc(v), 0, 0, N);
            if i == N - 1 {
                match step {
                    CalibrationStep::Done(offsets) => assert_eq!(offsets.left_dc, 1000),
                    CalibrationStep::Sampling => panic!("expected Done on final tick"),
                }
            }
        }
    }
}
