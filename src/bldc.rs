//! デュアルモーター駆動コア
//!
//! 電流・電圧サンプリング完了イベント（約16kHz）ごとに呼び出される
//! 周期ハンドラと、その共有状態のすべてを1つの所有構造体にまとめた
//! モジュールです。割り込みコンテキスト1つだけが書き込むため同期
//! プリミティブは不要ですが、ハンドラ自身の再入はオーバーランラッチで
//! 防ぎます（ラッチ中のtickは処理を丸ごと破棄し、後回しにはしません）。
//!
//! フェーズは2状態：起動キャリブレーション → モーター制御。切り替えは
//! セッション中一方向で、明示的な`start_calibration()`でのみ戻ります。

pub mod calibration;
pub mod current;
pub mod duty;
pub mod hall;

pub use calibration::{AdcCalibration, AdcOffsets, CalibrationStep};
pub use current::MotorCurrents;
pub use hall::PositionTracker;

use crate::config::BldcConfig;
use crate::control_law::{ControlLaw, LawInput, LawOutput};
use crate::fmt::*;
use crate::hardware::{AdcBuffer, HallLines, MotorBridge};
use crate::tone::ToneGenerator;
use crate::voltage_monitor::BatteryMonitor;

/// 2つの独立制御モーターの識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotorSide {
    Left,
    Right,
}

/// tickごとのアクティブフェーズ
///
/// キャリブレーション完了時にアキュムレータを確定オフセットに
/// 置き換える一方向の遷移を行います。
#[derive(Debug, Clone, Copy)]
enum Phase {
    /// 起動キャリブレーション（オフセット積算中）
    Calibration(AdcCalibration),
    /// 通常制御（オフセット確定済み）
    Control(AdcOffsets),
}

/// モーター1台分の状態
#[derive(Debug, Clone, Copy, Default)]
struct MotorState {
    /// 位置履歴とステップカウンタ
    tracker: PositionTracker,
    /// 最新の測定電流
    currents: MotorCurrents,
    /// 制御則へ渡した最新の入力
    input: LawInput,
    /// 制御則から読み戻した最新の出力
    output: LawOutput,
}

/// 駆動コア本体
///
/// すべての共有状態の唯一の所有者。`conversion_complete()`だけが
/// 割り込みコンテキストから呼ばれ、他の公開メソッド（目標値・有効化の
/// 書き込み、テレメトリ読み出し）は同一実行コンテキストから呼ぶ前提
/// です。外部から読む値は複数フィールド間の原子性を持たない
/// スナップショットとして扱ってください。
pub struct BldcCore<C: ControlLaw> {
    cfg: BldcConfig,
    phase: Phase,
    /// 通算tickカウンタ（リセットされない）
    tick: u64,
    /// オーバーランラッチ
    overrun: bool,
    /// 有効化リクエスト（安全のため初期値は無効）
    enable_req: bool,
    /// リクエストかつ両モーター無故障のときのみ真
    final_enable: bool,
    /// 故障ログの重複抑制用
    faulted: bool,
    target_left: i16,
    target_right: i16,
    left: MotorState,
    right: MotorState,
    law_left: C,
    law_right: C,
    battery: BatteryMonitor,
}

impl<C: ControlLaw> BldcCore<C> {
    /// コアを生成し、現在のホール状態を静止基準として
    /// キャリブレーションフェーズで開始します。
    pub fn new(
        cfg: BldcConfig,
        law_left: C,
        law_right: C,
        hall_left: HallLines,
        hall_right: HallLines,
    ) -> Self {
        let left_code = hall::decode_lines(hall_left);
        let right_code = hall::decode_lines(hall_right);
        let battery = BatteryMonitor::new(&cfg);
        let mut core = Self {
            cfg,
            phase: Phase::Calibration(AdcCalibration::start(left_code, right_code)),
            tick: 0,
            overrun: false,
            enable_req: false,
            final_enable: false,
            faulted: false,
            target_left: 0,
            target_right: 0,
            left: MotorState::default(),
            right: MotorState::default(),
            law_left,
            law_right,
            battery,
        };
        core.left.tracker.rebase(left_code);
        core.right.tracker.rebase(right_code);
        info!("drive core starting in calibration phase");
        core
    }

    /// キャリブレーションを明示的に再スタート
    ///
    /// オフセットを再計算する唯一の手段。現在のホール復号値を静止基準
    /// として取り直し、フェーズをキャリブレーションに戻します。
    pub fn start_calibration(&mut self, hall_left: HallLines, hall_right: HallLines) {
        let left_code = hall::decode_lines(hall_left);
        let right_code = hall::decode_lines(hall_right);
        self.left.tracker.rebase(left_code);
        self.right.tracker.rebase(right_code);
        self.phase = Phase::Calibration(AdcCalibration::start(left_code, right_code));
        info!("ADC offset calibration started");
    }

    /// 有効化リクエストを書き込む（入力デコード側の協調コンポーネント用）
    pub fn set_enable(&mut self, enable: bool) {
        self.enable_req = enable;
    }

    /// 左右の目標デューティを書き込む（およそ[-1000, 1000]）
    pub fn set_targets(&mut self, left: i16, right: i16) {
        self.target_left = left;
        self.target_right = right;
    }

    /// 周期ハンドラ本体
    ///
    /// 呼び出し側がハードウェアイベントをacknowledgeした直後に呼ぶこと。
    /// オーバーランラッチが立っている場合はこのtickの処理全体を破棄して
    /// 即座に戻ります（キューイングも追いつき処理もしない）。
    pub fn conversion_complete<L, R, T>(
        &mut self,
        adc: &AdcBuffer,
        hall_left: HallLines,
        hall_right: HallLines,
        left_bridge: &mut L,
        right_bridge: &mut R,
        tone: &mut T,
    ) where
        L: MotorBridge,
        R: MotorBridge,
        T: ToneGenerator,
    {
        self.tick = self.tick.wrapping_add(1);

        // 再入検出：このtickは丸ごと破棄
        if self.overrun {
            return;
        }
        self.overrun = true;

        match self.phase {
            Phase::Calibration(_) => self.calibration_tick(adc, hall_left, hall_right),
            Phase::Control(_) => {
                self.control_tick(adc, hall_left, hall_right, left_bridge, right_bridge)
            }
        }

        self.overrun = false;

        // トーンジェネレータ（モーター安全とは独立、tick源のみ共有）
        tone.tick(self.tick);

        // バッテリー電圧は間引き周期でのみフィルタ更新
        if self.tick % self.cfg.bat_filt_decimation == 0 {
            self.battery.update(adc.batt);
        }
    }

    /// キャリブレーションフェーズの1tick
    fn calibration_tick(&mut self, adc: &AdcBuffer, hall_left: HallLines, hall_right: HallLines) {
        let left_code = hall::decode_lines(hall_left);
        let right_code = hall::decode_lines(hall_right);

        let step = match &mut self.phase {
            Phase::Calibration(cal) => {
                cal.update(adc, left_code, right_code, self.cfg.calibration_samples)
            }
            Phase::Control(_) => return,
        };

        if let CalibrationStep::Done(offsets) = step {
            // 一方向のハンドオフ：以降このセッションでは制御tickが走る
            self.left.tracker.rebase(left_code);
            self.right.tracker.rebase(right_code);
            self.phase = Phase::Control(offsets);
            info!("ADC offset calibration finished, switching to motor control");
        }
    }

    /// 制御フェーズの1tick
    fn control_tick<L, R>(
        &mut self,
        adc: &AdcBuffer,
        hall_left: HallLines,
        hall_right: HallLines,
        left_bridge: &mut L,
        right_bridge: &mut R,
    ) where
        L: MotorBridge,
        R: MotorBridge,
    {
        let offsets = match self.phase {
            Phase::Control(offsets) => offsets,
            Phase::Calibration(_) => return,
        };

        // どちらかの制御則が前tickで故障コードを返していたら両方止める
        let fault =
            self.left.output.err_code != 0 || self.right.output.err_code != 0;
        self.final_enable = self.enable_req && !fault;
        if fault && !self.faulted {
            warn!(
                "control law fault (left={}, right={}), disabling both motors",
                self.left.output.err_code, self.right.output.err_code
            );
        } else if !fault && self.faulted {
            info!("control law fault cleared");
        }
        self.faulted = fault;

        let dc_limit = self.cfg.dc_cur_limit();
        let period = self.cfg.pwm_period();

        // ========================= 左モーター ============================
        self.left.currents = current::left_currents(&offsets, adc);

        // Level 2保護：ハード過電流かリクエスト無効でブリッジ出力を遮断
        left_bridge.set_output_enable(current::bridge_enabled(
            self.left.currents.dc_link,
            dc_limit,
            self.enable_req,
        ));

        let margin = duty::margin_for(self.cfg.ctrl_type_left, self.cfg.foc_margin);
        let (a, b, c) = hall_left.active();
        self.left.tracker.update(hall::decode(a, b, c));

        self.left.input = LawInput {
            enable: self.final_enable,
            ctrl_type: self.cfg.ctrl_type_left,
            target: self.target_left,
            hall_a: a,
            hall_b: b,
            hall_c: c,
            cur_pha_ab: self.left.currents.pha_ab,
            cur_pha_bc: self.left.currents.pha_bc,
            cur_dc_link: self.left.currents.dc_link,
            mech_angle: None,
        };
        // モーター非搭載ビルドでは制御則ステップを省略し、直前の出力を使う
        #[cfg(feature = "motor-left")]
        {
            self.left.output = self.law_left.step(&self.left.input);
        }

        left_bridge.set_duty(
            duty::apply(self.left.output.duty_a, period, margin),
            duty::apply(self.left.output.duty_b, period, margin),
            duty::apply(self.left.output.duty_c, period, margin),
        );

        // ========================= 右モーター ============================
        self.right.currents = current::right_currents(&offsets, adc);

        right_bridge.set_output_enable(current::bridge_enabled(
            self.right.currents.dc_link,
            dc_limit,
            self.enable_req,
        ));

        let margin = duty::margin_for(self.cfg.ctrl_type_right, self.cfg.foc_margin);
        let (a, b, c) = hall_right.active();
        self.right.tracker.update(hall::decode(a, b, c));

        self.right.input = LawInput {
            enable: self.final_enable,
            ctrl_type: self.cfg.ctrl_type_right,
            target: self.target_right,
            hall_a: a,
            hall_b: b,
            hall_c: c,
            cur_pha_ab: self.right.currents.pha_ab,
            cur_pha_bc: self.right.currents.pha_bc,
            cur_dc_link: self.right.currents.dc_link,
            mech_angle: None,
        };
        #[cfg(feature = "motor-right")]
        {
            self.right.output = self.law_right.step(&self.right.input);
        }

        right_bridge.set_duty(
            duty::apply(self.right.output.duty_a, period, margin),
            duty::apply(self.right.output.duty_b, period, margin),
            duty::apply(self.right.output.duty_c, period, margin),
        );
    }

    fn motor(&self, side: MotorSide) -> &MotorState {
        match side {
            MotorSide::Left => &self.left,
            MotorSide::Right => &self.right,
        }
    }

    /// キャリブレーションフェーズ中かどうか
    pub fn is_calibrating(&self) -> bool {
        matches!(self.phase, Phase::Calibration(_))
    }

    /// 通算tickカウンタ
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// 最終有効化状態（リクエストかつ両モーター無故障）
    pub fn final_enable(&self) -> bool {
        self.final_enable
    }

    /// デバウンス済み転流ステップ数
    pub fn steps(&self, side: MotorSide) -> u16 {
        self.motor(side).tracker.steps()
    }

    /// 最新の測定電流スナップショット
    pub fn currents(&self, side: MotorSide) -> MotorCurrents {
        self.motor(side).currents
    }

    /// 制御則へ渡した最新の入力スナップショット
    pub fn last_input(&self, side: MotorSide) -> LawInput {
        self.motor(side).input
    }

    /// 制御則から読み戻した最新の出力スナップショット
    pub fn last_output(&self, side: MotorSide) -> LawOutput {
        self.motor(side).output
    }

    /// フィルタ済みバッテリー電圧 [ADC counts]
    pub fn battery_voltage(&self) -> i16 {
        self.battery.voltage()
    }
}
