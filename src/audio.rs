//! Web Audio playback for game cues
//!
//! Everything is synthesized with oscillators; there are no sample files.
//! The engine is a looping drone started and stopped by cues, the rest are
//! one-shot envelopes. Every Web Audio failure is swallowed.

use web_sys::{AudioContext, AudioContextState, GainNode, OscillatorNode, OscillatorType};

use crate::Settings;
use crate::ui::SoundCue;

/// Running engine voice
struct EngineDrone {
    osc: OscillatorNode,
    gain: GainNode,
}

pub struct AudioManager {
    ctx: Option<AudioContext>,
    engine: Option<EngineDrone>,
    sfx_gain: f32,
    engine_gain: f32,
}

impl AudioManager {
    pub fn new(settings: &Settings) -> Self {
        // Fails outside a secure context
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("AudioContext unavailable, audio disabled");
        }
        Self {
            ctx,
            engine: None,
            sfx_gain: settings.sfx_gain(),
            engine_gain: settings.engine_gain(),
        }
    }

    /// Pick up new volumes; a running drone is adjusted in place
    pub fn apply_settings(&mut self, settings: &Settings) {
        self.sfx_gain = settings.sfx_gain();
        self.engine_gain = settings.engine_gain();
        if let Some(engine) = &self.engine {
            engine.gain.gain().set_value(self.engine_gain * 0.15);
        }
    }

    /// Unlock the context from inside a user gesture
    pub fn resume(&self) {
        if let Some(ctx) = &self.ctx {
            if ctx.state() == AudioContextState::Suspended {
                let _ = ctx.resume();
            }
        }
    }

    pub fn play(&mut self, cue: SoundCue) {
        self.resume();
        match cue {
            SoundCue::EngineStart => self.start_engine(),
            SoundCue::EngineStop => self.stop_engine(),
            SoundCue::Crash => {
                self.stop_engine();
                self.one_shot(play_crash);
            }
            SoundCue::Nitro => self.one_shot(play_nitro),
            SoundCue::HighScore => self.one_shot(play_high_score),
        }
    }

    fn one_shot(&self, sound: fn(&AudioContext, f32)) {
        if self.sfx_gain <= 0.0 {
            return;
        }
        if let Some(ctx) = &self.ctx {
            sound(ctx, self.sfx_gain);
        }
    }

    fn start_engine(&mut self) {
        if self.engine.is_some() {
            return;
        }
        let Some(ctx) = &self.ctx else { return };
        let Some((osc, gain)) = create_osc(ctx, 55.0, OscillatorType::Sawtooth) else {
            return;
        };
        gain.gain().set_value(self.engine_gain * 0.15);
        if osc.start().is_err() {
            log::warn!("Engine drone failed to start");
            return;
        }
        self.engine = Some(EngineDrone { osc, gain });
    }

    fn stop_engine(&mut self) {
        if let Some(engine) = self.engine.take() {
            engine.osc.stop().ok();
            engine.osc.disconnect().ok();
        }
    }
}

impl Drop for AudioManager {
    fn drop(&mut self) {
        self.stop_engine();
    }
}

/// Oscillator routed through its own gain to the destination
fn create_osc(
    ctx: &AudioContext,
    freq: f32,
    osc_type: OscillatorType,
) -> Option<(OscillatorNode, GainNode)> {
    let osc = ctx.create_oscillator().ok()?;
    let gain = ctx.create_gain().ok()?;

    osc.set_type(osc_type);
    osc.frequency().set_value(freq);
    osc.connect_with_audio_node(&gain).ok()?;
    gain.connect_with_audio_node(&ctx.destination()).ok()?;

    Some((osc, gain))
}

/// Crash: noisy crunch over a falling thud
fn play_crash(ctx: &AudioContext, vol: f32) {
    let t = ctx.current_time();

    if let Some((osc, gain)) = create_osc(ctx, 120.0, OscillatorType::Sawtooth) {
        gain.gain().set_value_at_time(vol * 0.5, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.5)
            .ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(30.0, t + 0.5)
            .ok();
        osc.start().ok();
        osc.stop_with_when(t + 0.6).ok();
    }

    if let Some((osc, gain)) = create_osc(ctx, 900.0, OscillatorType::Square) {
        gain.gain().set_value_at_time(vol * 0.2, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.15)
            .ok();
        for (i, freq) in [900.0, 2400.0, 600.0, 1800.0, 300.0].iter().enumerate() {
            osc.frequency()
                .set_value_at_time(*freq, t + i as f64 * 0.025)
                .ok();
        }
        osc.start().ok();
        osc.stop_with_when(t + 0.2).ok();
    }
}

/// Nitro: rising whoosh
fn play_nitro(ctx: &AudioContext, vol: f32) {
    let Some((osc, gain)) = create_osc(ctx, 150.0, OscillatorType::Triangle) else {
        return;
    };
    let t = ctx.current_time();

    gain.gain().set_value_at_time(0.01, t).ok();
    gain.gain()
        .linear_ramp_to_value_at_time(vol * 0.35, t + 0.08)
        .ok();
    gain.gain()
        .exponential_ramp_to_value_at_time(0.01, t + 0.45)
        .ok();
    osc.frequency()
        .exponential_ramp_to_value_at_time(900.0, t + 0.4)
        .ok();

    osc.start().ok();
    osc.stop_with_when(t + 0.5).ok();
}

/// High score: short rising arpeggio
fn play_high_score(ctx: &AudioContext, vol: f32) {
    for (i, freq) in [523.0, 659.0, 784.0, 1047.0].iter().enumerate() {
        let Some((osc, gain)) = create_osc(ctx, *freq, OscillatorType::Triangle) else {
            continue;
        };
        // After the crash has died down
        let t = ctx.current_time() + 0.4 + i as f64 * 0.09;
        gain.gain().set_value_at_time(vol * 0.25, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.25)
            .ok();
        osc.start_with_when(t).ok();
        osc.stop_with_when(t + 0.3).ok();
    }
}
