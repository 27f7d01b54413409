//! JavaScript sources the generator fills in.
//!
//! `CANVAS_CLASS` is the shared class shell; the per-type `*_MEMBERS` blocks
//! supply its `init()` and `step(dt)` methods. Members read everything from
//! `this.config`, so they contain no placeholders of their own.

pub const CANVAS_CLASS: &str = r##"/**
 * {{name}}
 *
 * {{description}}
 *
 * Effect type: {{effect_type}}
 * Usage:
 *   const effect = new {{class_name}}(document.querySelector('canvas'));
 *   effect.start();
 */
class {{class_name}} {
  constructor(canvas, options = {}) {
    this.canvas = canvas;
    this.ctx = canvas.getContext('2d');
    this.config = Object.assign(
      {
        count: {{count}},
        speed: {{speed}},
        size: {{size}},
        lifetime: {{lifetime}},
        gravity: {{gravity}},
        wind: {{wind}},
        spread: {{spread}},
        opacity: {{opacity}},
        glow: {{glow}},
        fade: {{fade}},
        amplitude: {{amplitude}},
        frequency: {{frequency}},
        colors: {{colors}},
        background: {{background}},
        text: {{text}},
      },
      options
    );
    this.running = false;
    this.frame = null;
    this.lastTime = 0;
    this.pointer = { x: -1, y: -1, active: false };
    this.handleResize = () => this.resize();
    this.handlePointer = (event) => this.onPointer(event);
    this.resize();
    this.init();
  }

  resize() {
    const ratio = window.devicePixelRatio || 1;
    const rect = this.canvas.getBoundingClientRect();
    this.width = rect.width || this.canvas.width;
    this.height = rect.height || this.canvas.height;
    this.canvas.width = Math.round(this.width * ratio);
    this.canvas.height = Math.round(this.height * ratio);
    this.ctx.setTransform(ratio, 0, 0, ratio, 0, 0);
  }

  onPointer(event) {
    const rect = this.canvas.getBoundingClientRect();
    this.pointer.x = event.clientX - rect.left;
    this.pointer.y = event.clientY - rect.top;
    this.pointer.active = true;
    if (event.type === 'pointerdown' && this.onPress) {
      this.onPress(this.pointer.x, this.pointer.y);
    }
  }

  color(index) {
    const colors = this.config.colors;
    return colors[index % colors.length];
  }

  randomColor() {
    return this.color(Math.floor(Math.random() * this.config.colors.length));
  }

  random(min, max) {
    return min + Math.random() * (max - min);
  }

  clear() {
    const ctx = this.ctx;
    ctx.globalAlpha = this.config.fade;
    ctx.fillStyle = this.config.background;
    ctx.fillRect(0, 0, this.width, this.height);
    ctx.globalAlpha = 1;
  }

  start() {
    if (this.running) return;
    this.running = true;
    window.addEventListener('resize', this.handleResize);
    this.canvas.addEventListener('pointermove', this.handlePointer);
    this.canvas.addEventListener('pointerdown', this.handlePointer);
    const tick = (time) => {
      if (!this.running) return;
      const dt = this.lastTime ? Math.min((time - this.lastTime) / 16.667, 3) : 1;
      this.lastTime = time;
      this.clear();
      this.step(dt);
      this.frame = requestAnimationFrame(tick);
    };
    this.frame = requestAnimationFrame(tick);
  }

  stop() {
    this.running = false;
    this.lastTime = 0;
    if (this.frame !== null) cancelAnimationFrame(this.frame);
    this.frame = null;
    window.removeEventListener('resize', this.handleResize);
    this.canvas.removeEventListener('pointermove', this.handlePointer);
    this.canvas.removeEventListener('pointerdown', this.handlePointer);
  }

{{members}}
}
"##;

pub const PARTICLE_EMITTER_MEMBERS: &str = r##"  init() {
    this.particles = [];
    for (let i = 0; i < this.config.count; i++) {
      this.particles.push(this.spawn(true));
    }
  }

  spawn(initial) {
    const c = this.config;
    const angle = -Math.PI / 2 + this.random(-c.spread, c.spread) / 2;
    const speed = c.speed * this.random(0.5, 1.2);
    return {
      x: this.width / 2 + this.random(-this.width * 0.15, this.width * 0.15),
      y: initial ? this.random(0, this.height) : this.height * 0.85,
      vx: Math.cos(angle) * speed,
      vy: Math.sin(angle) * speed,
      size: c.size * this.random(0.5, 1.5),
      life: initial ? Math.random() : 1,
      color: this.randomColor(),
    };
  }

  step(dt) {
    const c = this.config;
    const ctx = this.ctx;
    const decay = dt / (c.lifetime * 60);
    ctx.shadowBlur = c.glow;
    for (let i = 0; i < this.particles.length; i++) {
      const p = this.particles[i];
      p.vy += c.gravity * dt;
      p.vx += c.wind * 0.01 * dt;
      p.x += p.vx * dt;
      p.y += p.vy * dt;
      p.life -= decay;
      if (p.life <= 0 || p.y < -20 || p.y > this.height + 20) {
        this.particles[i] = this.spawn(false);
        continue;
      }
      ctx.globalAlpha = p.life * c.opacity;
      ctx.shadowColor = p.color;
      ctx.fillStyle = p.color;
      ctx.beginPath();
      ctx.arc(p.x, p.y, p.size * p.life + 0.5, 0, Math.PI * 2);
      ctx.fill();
    }
    ctx.globalAlpha = 1;
    ctx.shadowBlur = 0;
  }"##;

pub const PRECIPITATION_MEMBERS: &str = r##"  init() {
    this.drops = [];
    for (let i = 0; i < this.config.count; i++) {
      this.drops.push(this.spawn(true));
    }
  }

  spawn(initial) {
    const c = this.config;
    return {
      x: this.random(-this.width * 0.1, this.width * 1.1),
      y: initial ? this.random(0, this.height) : this.random(-40, -5),
      speed: c.speed * this.random(0.7, 1.3),
      size: c.size * this.random(0.6, 1.4),
      sway: Math.random() * Math.PI * 2,
      color: this.randomColor(),
    };
  }

  step(dt) {
    const c = this.config;
    const ctx = this.ctx;
    // heavy drops fall as streaks, light ones drift as flakes
    const streak = c.gravity > 0.1;
    ctx.globalAlpha = c.opacity;
    for (let i = 0; i < this.drops.length; i++) {
      const d = this.drops[i];
      d.sway += 0.02 * dt;
      const dx = (c.wind + (streak ? 0 : Math.sin(d.sway) * 0.6)) * dt;
      const dy = (d.speed + c.gravity * 10) * dt;
      d.x += dx;
      d.y += dy;
      if (d.y > this.height + 10) {
        this.drops[i] = this.spawn(false);
        continue;
      }
      ctx.strokeStyle = d.color;
      ctx.fillStyle = d.color;
      ctx.beginPath();
      if (streak) {
        ctx.lineWidth = d.size * 0.5;
        ctx.moveTo(d.x, d.y);
        ctx.lineTo(d.x - dx * 2, d.y - dy * 2);
        ctx.stroke();
      } else {
        ctx.arc(d.x, d.y, d.size, 0, Math.PI * 2);
        ctx.fill();
      }
    }
    ctx.globalAlpha = 1;
  }"##;

pub const STARFIELD_MEMBERS: &str = r##"  init() {
    this.stars = [];
    for (let i = 0; i < this.config.count; i++) {
      this.stars.push(this.spawn(true));
    }
  }

  spawn(initial) {
    return {
      x: this.random(-1, 1),
      y: this.random(-1, 1),
      z: initial ? this.random(0.05, 1) : 1,
      twinkle: Math.random() * Math.PI * 2,
      color: this.randomColor(),
    };
  }

  step(dt) {
    const c = this.config;
    const ctx = this.ctx;
    const cx = this.width / 2;
    const cy = this.height / 2;
    const scale = Math.max(this.width, this.height) / 2;
    ctx.shadowBlur = c.glow;
    for (let i = 0; i < this.stars.length; i++) {
      const s = this.stars[i];
      s.z -= 0.004 * c.speed * dt;
      s.twinkle += 0.05 * dt;
      const x = cx + (s.x / s.z) * scale;
      const y = cy + (s.y / s.z) * scale;
      if (s.z <= 0.01 || x < 0 || x > this.width || y < 0 || y > this.height) {
        this.stars[i] = this.spawn(false);
        continue;
      }
      const depth = 1 - s.z;
      const alpha = c.opacity * (0.6 + 0.4 * Math.sin(s.twinkle)) * depth + 0.1;
      ctx.globalAlpha = Math.min(1, alpha);
      ctx.fillStyle = s.color;
      ctx.shadowColor = s.color;
      ctx.beginPath();
      ctx.arc(x, y, c.size * depth + 0.3, 0, Math.PI * 2);
      ctx.fill();
    }
    ctx.globalAlpha = 1;
    ctx.shadowBlur = 0;
  }"##;

pub const WAVE_LINES_MEMBERS: &str = r##"  init() {
    this.phase = 0;
  }

  step(dt) {
    const c = this.config;
    const ctx = this.ctx;
    const lines = Math.max(1, Math.min(Math.round(c.count), 24));
    this.phase += 0.03 * c.speed * dt;
    ctx.lineWidth = c.size;
    ctx.shadowBlur = c.glow;
    ctx.globalAlpha = c.opacity;
    for (let l = 0; l < lines; l++) {
      const offset = (l + 1) / (lines + 1);
      const color = this.color(l);
      ctx.strokeStyle = color;
      ctx.shadowColor = color;
      ctx.beginPath();
      for (let x = 0; x <= this.width; x += 4) {
        const y =
          this.height * offset +
          Math.sin(x * c.frequency + this.phase + l * 0.6) * c.amplitude +
          Math.sin(x * c.frequency * 0.5 - this.phase * 0.7) * c.amplitude * 0.3;
        if (x === 0) ctx.moveTo(x, y);
        else ctx.lineTo(x, y);
      }
      ctx.stroke();
    }
    ctx.globalAlpha = 1;
    ctx.shadowBlur = 0;
  }"##;

pub const GRADIENT_SHIFT_MEMBERS: &str = r##"  init() {
    this.phase = 0;
  }

  step(dt) {
    const c = this.config;
    const ctx = this.ctx;
    this.phase += 0.002 * c.speed * dt;
    const angle = this.phase * Math.PI * 2;
    const reach = Math.max(this.width, this.height);
    const cx = this.width / 2;
    const cy = this.height / 2;
    const gradient = ctx.createLinearGradient(
      cx - Math.cos(angle) * reach,
      cy - Math.sin(angle) * reach,
      cx + Math.cos(angle) * reach,
      cy + Math.sin(angle) * reach
    );
    const stops = c.colors.length > 1 ? c.colors : [c.background, c.colors[0]];
    stops.forEach((color, i) => gradient.addColorStop(i / (stops.length - 1), color));
    ctx.globalAlpha = c.opacity;
    ctx.shadowBlur = c.glow;
    ctx.fillStyle = gradient;
    ctx.fillRect(0, 0, this.width, this.height);
    ctx.globalAlpha = 1;
    ctx.shadowBlur = 0;
  }"##;

pub const TEXT_REVEAL_MEMBERS: &str = r##"  init() {
    this.progress = 0;
    this.hold = 0;
  }

  step(dt) {
    const c = this.config;
    const ctx = this.ctx;
    const text = String(c.text);
    const fontSize = Math.max(8, c.size);
    ctx.font = `bold ${fontSize}px sans-serif`;
    ctx.textAlign = 'left';
    ctx.textBaseline = 'middle';
    if (this.progress < text.length) {
      this.progress = Math.min(text.length, this.progress + 0.15 * c.speed * dt);
    } else {
      this.hold += dt / 60;
      if (this.hold > c.lifetime) {
        this.progress = 0;
        this.hold = 0;
      }
    }
    let x = (this.width - ctx.measureText(text).width) / 2;
    const y = this.height / 2;
    ctx.shadowBlur = c.glow;
    for (let i = 0; i < text.length; i++) {
      const ch = text[i];
      const reveal = Math.max(0, Math.min(1, this.progress - i));
      if (reveal > 0) {
        const color = this.color(i);
        ctx.globalAlpha = reveal * c.opacity;
        ctx.fillStyle = color;
        ctx.shadowColor = color;
        ctx.fillText(ch, x, y + (1 - reveal) * fontSize * 0.5);
      }
      x += ctx.measureText(ch).width;
    }
    ctx.globalAlpha = 1;
    ctx.shadowBlur = 0;
  }"##;

pub const CURSOR_TRAIL_MEMBERS: &str = r##"  init() {
    this.points = [];
  }

  step(dt) {
    const c = this.config;
    const ctx = this.ctx;
    if (this.pointer.active) {
      this.points.push({ x: this.pointer.x, y: this.pointer.y, life: 1 });
    }
    const max = Math.max(2, Math.round(c.count));
    while (this.points.length > max) this.points.shift();
    const decay = (dt * c.speed) / (c.lifetime * 60);
    ctx.shadowBlur = c.glow;
    ctx.lineCap = 'round';
    for (let i = 1; i < this.points.length; i++) {
      const a = this.points[i - 1];
      const b = this.points[i];
      b.life -= decay;
      if (b.life <= 0) continue;
      const color = this.color(i);
      ctx.globalAlpha = b.life * c.opacity;
      ctx.strokeStyle = color;
      ctx.shadowColor = color;
      ctx.lineWidth = c.size * b.life;
      ctx.beginPath();
      ctx.moveTo(a.x, a.y);
      ctx.lineTo(b.x, b.y);
      ctx.stroke();
    }
    this.points = this.points.filter((p, i) => i === 0 || p.life > 0);
    ctx.globalAlpha = 1;
    ctx.shadowBlur = 0;
  }"##;

pub const RIPPLE_MEMBERS: &str = r##"  init() {
    this.rings = [];
    this.elapsed = 0;
    this.onPress = (x, y) => this.addRing(x, y);
  }

  addRing(x, y) {
    this.rings.push({ x, y, age: 0, color: this.color(this.rings.length) });
    const max = Math.max(1, Math.round(this.config.count));
    while (this.rings.length > max) this.rings.shift();
  }

  step(dt) {
    const c = this.config;
    const ctx = this.ctx;
    this.elapsed += dt / 60;
    if (this.elapsed > c.lifetime / 2) {
      this.elapsed = 0;
      this.addRing(this.random(0, this.width), this.random(0, this.height));
    }
    const frames = c.lifetime * 60;
    ctx.lineWidth = c.size;
    ctx.shadowBlur = c.glow;
    for (const ring of this.rings) {
      ring.age += dt;
      const t = ring.age / frames;
      if (t >= 1) continue;
      ctx.globalAlpha = (1 - t) * c.opacity;
      ctx.strokeStyle = ring.color;
      ctx.shadowColor = ring.color;
      ctx.beginPath();
      ctx.arc(ring.x, ring.y, t * c.amplitude * (c.speed / 2 + 0.5), 0, Math.PI * 2);
      ctx.stroke();
    }
    this.rings = this.rings.filter((ring) => ring.age < frames);
    ctx.globalAlpha = 1;
    ctx.shadowBlur = 0;
  }"##;

pub const CANVAS_MODULE: &str = r##"{{class_source}}
export default {{class_name}};
"##;

pub const REACT_MODULE: &str = r##"import { useEffect, useRef } from 'react';

{{class_source}}
const canvasStyle = { width: '100%', height: '100%', display: 'block' };

export default function {{component_name}}(props) {
  const canvasRef = useRef(null);

  useEffect(() => {
    const effect = new {{class_name}}(canvasRef.current, props.options || {});
    effect.start();
    return () => effect.stop();
  }, [props.options]);

  return <canvas ref={canvasRef} className={props.className} style={canvasStyle} />;
}
"##;
