//! Web Audio backend

use web_sys::{
    AudioBufferSourceNode, AudioContext, BiquadFilterNode, BiquadFilterType, GainNode,
    OscillatorNode, OscillatorType,
};

use super::{AudioBackend, AudioOpener, CrowdBed, GAIN_FLOOR, Tone, Waveform};

impl From<Waveform> for OscillatorType {
    fn from(w: Waveform) -> Self {
        match w {
            Waveform::Sine => OscillatorType::Sine,
            Waveform::Square => OscillatorType::Square,
            Waveform::Sawtooth => OscillatorType::Sawtooth,
            Waveform::Triangle => OscillatorType::Triangle,
        }
    }
}

/// Nodes of the running crowd bed; held so they are never collected
struct CrowdGraph {
    _source: AudioBufferSourceNode,
    _filters: (BiquadFilterNode, BiquadFilterNode),
    _lfo: OscillatorNode,
    lfo_gain: GainNode,
    gain: GainNode,
}

pub struct WebAudioBackend {
    ctx: AudioContext,
    crowd: Option<CrowdGraph>,
}

impl WebAudioBackend {
    /// May fail outside a secure context or in very old browsers
    pub fn open() -> Option<Self> {
        let ctx = AudioContext::new().ok()?;
        Some(Self { ctx, crowd: None })
    }

    /// Opener for [`super::AudioEngine::new`]
    pub fn opener() -> AudioOpener {
        Box::new(|| {
            let backend = Self::open();
            if backend.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            backend.map(|b| Box::new(b) as Box<dyn AudioBackend>)
        })
    }

    /// Create an oscillator with gain envelope
    fn create_osc(&self, freq: f32, osc_type: OscillatorType) -> Option<(OscillatorNode, GainNode)> {
        let osc = self.ctx.create_oscillator().ok()?;
        let gain = self.ctx.create_gain().ok()?;

        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&self.ctx.destination()).ok()?;

        Some((osc, gain))
    }

    fn create_filter(&self, kind: BiquadFilterType, freq: f32) -> Option<BiquadFilterNode> {
        let filter = self.ctx.create_biquad_filter().ok()?;
        filter.set_type(kind);
        filter.frequency().set_value(freq);
        Some(filter)
    }

    /// noise -> highpass -> lowpass -> gain -> out, with an LFO on the gain
    fn build_crowd(&self, noise: &[f32], bed: &CrowdBed) -> Option<CrowdGraph> {
        let sample_rate = self.ctx.sample_rate();
        let buffer = self
            .ctx
            .create_buffer(1, noise.len() as u32, sample_rate)
            .ok()?;
        let mut samples = noise.to_vec();
        buffer.copy_to_channel(&mut samples, 0).ok()?;

        let source = self.ctx.create_buffer_source().ok()?;
        source.set_buffer(Some(&buffer));
        source.set_loop(true);

        let highpass = self.create_filter(BiquadFilterType::Highpass, bed.highpass_hz)?;
        let lowpass = self.create_filter(BiquadFilterType::Lowpass, bed.lowpass_hz)?;

        let gain = self.ctx.create_gain().ok()?;
        gain.gain().set_value(0.0);

        let lfo = self.ctx.create_oscillator().ok()?;
        lfo.set_type(OscillatorType::Sine);
        lfo.frequency().set_value(bed.lfo_hz);
        let lfo_gain = self.ctx.create_gain().ok()?;
        lfo_gain.gain().set_value(0.0);

        lfo.connect_with_audio_node(&lfo_gain).ok()?;
        lfo_gain.connect_with_audio_param(&gain.gain()).ok()?;

        source.connect_with_audio_node(&highpass).ok()?;
        highpass.connect_with_audio_node(&lowpass).ok()?;
        lowpass.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&self.ctx.destination()).ok()?;

        source.start().ok()?;
        lfo.start().ok()?;

        Some(CrowdGraph {
            _source: source,
            _filters: (highpass, lowpass),
            _lfo: lfo,
            lfo_gain,
            gain,
        })
    }
}

impl AudioBackend for WebAudioBackend {
    fn resume(&self) {
        if self.ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = self.ctx.resume();
        }
    }

    fn sample_rate(&self) -> f32 {
        self.ctx.sample_rate()
    }

    fn play_tone(&mut self, tone: &Tone, volume: f32) {
        let Some((osc, gain)) = self.create_osc(tone.freq, tone.waveform.into()) else {
            return;
        };
        let t = self.ctx.current_time();
        let peak = (tone.gain * volume).max(GAIN_FLOOR);

        osc.frequency().set_value_at_time(tone.freq, t).ok();
        if tone.attack > 0.0 {
            gain.gain().set_value_at_time(GAIN_FLOOR, t).ok();
            gain.gain()
                .linear_ramp_to_value_at_time(peak, t + tone.attack)
                .ok();
        } else {
            gain.gain().set_value_at_time(peak, t).ok();
        }
        gain.gain()
            .exponential_ramp_to_value_at_time(GAIN_FLOOR, t + tone.duration)
            .ok();

        osc.start_with_when(t).ok();
        osc.stop_with_when(t + tone.stop_after()).ok();
    }

    fn start_crowd(&mut self, noise: &[f32], bed: &CrowdBed) -> bool {
        if self.crowd.is_some() {
            return true;
        }
        self.crowd = self.build_crowd(noise, bed);
        self.crowd.is_some()
    }

    fn ramp_crowd(&mut self, volume: f32, lfo_depth: f32, ramp_secs: f64) {
        let Some(crowd) = &self.crowd else { return };
        let t = self.ctx.current_time();

        for (param, target) in [
            (crowd.gain.gain(), volume),
            (crowd.lfo_gain.gain(), lfo_depth),
        ] {
            param.cancel_scheduled_values(t).ok();
            param.set_value_at_time(param.value(), t).ok();
            param
                .linear_ramp_to_value_at_time(target, t + ramp_secs)
                .ok();
        }
    }
}
