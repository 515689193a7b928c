//! Instrumentation appended to the bootstrap script.

/// First line of the appended block. Text from here on is replaced when a
/// bootstrap is patched again.
pub const BEGIN_MARKER: &str = "// ==== flutter extension instrumentation ====";

/// Last line of the appended block.
pub const END_MARKER: &str = "// ==== end flutter extension instrumentation ====";

pub const BOOTSTRAP_TEMPLATE: &str = r#"{{begin_marker}}
{{debug.patch_start}}

(function() {
  var extensionId = '';

  try {
    if (typeof chrome !== 'undefined' && chrome.runtime && chrome.runtime.id) {
      extensionId = chrome.runtime.id;
    }
  } catch (e) {}

  if (!extensionId && window[{{extension_id_var}}]) {
    extensionId = window[{{extension_id_var}}];
  }

  if (!extensionId) {
    const scripts = document.querySelectorAll('script[src*="chrome-extension://"]');
    if (scripts.length > 0) {
      const match = scripts[0].src.match(/chrome-extension:\/\/([^/]+)/);
      if (match) extensionId = match[1];
    }
  }

  if (!extensionId) {
    try {
      const currentScript = document.currentScript;
      if (currentScript && currentScript.src && currentScript.src.includes('chrome-extension://')) {
        const match = currentScript.src.match(/chrome-extension:\/\/([^/]+)/);
        if (match) extensionId = match[1];
      }
    } catch (e) {}
  }

  {{debug.extension_id}}

  if (extensionId) {
    const origin = 'chrome-extension://' + extensionId + '/';
    const isRelative = function(url) {
      return !url.startsWith('http') &&
        !url.startsWith('chrome-extension://') &&
        !url.startsWith('data:') &&
        !url.startsWith('blob:');
    };

    Object.defineProperty(document, 'baseURI', {
      get: function() {
        return origin;
      },
      configurable: true
    });

    const originalFetch = window.fetch;
    window.fetch = function(url, options) {
      {{debug.fetch_intercepted}}
      if (typeof url === 'string' && isRelative(url)) {
        const newUrl = origin + url.replace(/^\/+/, '');
        {{debug.fetch_redirected}}
        url = newUrl;
      }
      return originalFetch.call(this, url, options);
    };

    const originalImport = window.import;
    if (originalImport) {
      window.import = function(url) {
        {{debug.import_intercepted}}
        if (typeof url === 'string' && isRelative(url)) {
          const newUrl = origin + url.replace(/^\/+/, '');
          {{debug.import_redirected}}
          url = newUrl;
        }
        return originalImport.call(this, url);
      };
    }

    if (typeof window.c === 'undefined') {
      window.c = function(...parts) {
        const path = parts
          .filter(function(p) { return !!p; })
          .map(function(p) { return String(p).replace(/^\/+|\/+$/g, ''); })
          .filter(function(p) { return p.length; })
          .join('/');
        const fullUrl = origin + path;
        {{debug.path_resolved}}
        return fullUrl;
      };
    }
  } else {
    {{debug.extension_id_missing}}
  }

  window.extensionId = extensionId;
})();

(function() {
  const isCdnCanvasKit = function(value) {
    return typeof value === 'string' && value.includes('gstatic.com/flutter-canvaskit');
  };
  const localCanvasKitPath = function(value) {
    const parts = value.split('/');
    const filename = parts[parts.length - 1];
    return value.includes('/chromium/') ? 'canvaskit/chromium/' + filename : 'canvaskit/' + filename;
  };

  const originalCreateElement = document.createElement;
  document.createElement = function(tagName) {
    const element = originalCreateElement.apply(this, arguments);
    if (typeof tagName !== 'string' || tagName.toLowerCase() !== 'script') {
      return element;
    }

    const originalSetAttribute = element.setAttribute;
    element.setAttribute = function(name, value) {
      if (name === 'src' && isCdnCanvasKit(value)) {
        const localPath = localCanvasKitPath(value);
        {{debug.canvaskit_redirected}}
        value = localPath;
      }
      return originalSetAttribute.call(this, name, value);
    };

    const srcDescriptor = Object.getOwnPropertyDescriptor(HTMLScriptElement.prototype, 'src') || {
      set: function(value) {
        originalSetAttribute.call(this, 'src', value);
      },
      get: function() {
        return this.getAttribute('src');
      }
    };
    Object.defineProperty(element, 'src', {
      set: function(value) {
        if (isCdnCanvasKit(value)) {
          const localPath = localCanvasKitPath(value);
          {{debug.canvaskit_redirected}}
          value = localPath;
        }
        srcDescriptor.set.call(this, value);
      },
      get: function() {
        return srcDescriptor.get.call(this);
      },
      configurable: true
    });
    return element;
  };
})();

(function() {
  const flutterRuntime = window._flutter || (window._flutter = {});
  window._flutter_web_locale_use_local_canvaskit = true;
  flutterRuntime.engineInitializer = flutterRuntime.engineInitializer || {};
  flutterRuntime.engineInitializer.useLocalCanvasKit = true;
  flutterRuntime.engineInitializer.canvasKitBaseUrl = 'canvaskit/';

  const compileTarget = {{compile_target}};
  const renderer = {{renderer}};
  {{debug.descriptor_installed}}
  flutterRuntime.buildConfig = {{build_config}};

  const hostElement = function() {
    const container = document.getElementById({{container_id}});
    if (container) {
      {{debug.host_found}}
      return container;
    }
    {{debug.host_missing}}
    return document.body;
  };
  const engineConfig = function() {
    return {
      hostElement: hostElement(),
      renderer: renderer,
      canvasKitVariant: 'auto',
      useLocalCanvasKit: true,
      canvasKitBaseUrl: 'canvaskit/'
    };
  };
  const onEntrypointLoaded = async function(engineInitializer) {
    {{debug.entrypoint_loaded}}
    try {
      const appRunner = await engineInitializer.initializeEngine(engineConfig());
      {{debug.engine_ready}}
      await appRunner.runApp();
      {{debug.app_started}}
    } catch (error) {
      {{debug.app_failed}}
    }
  };

  {{debug.init_start}}
  {{debug.entrypoint_loading}}
  const flutterLoader = flutterRuntime.loader;
{{#if binary}}
  flutterLoader.load({
    serviceWorkerSettings: null,
    config: engineConfig(),
    onEntrypointLoaded: onEntrypointLoaded
  });
{{else}}
  const entrypointUrl = (function() {
    if (window.extensionId) {
      const url = 'chrome-extension://' + window.extensionId + '/' + {{entrypoint}};
      {{debug.entrypoint_url}}
      return url;
    }
    {{debug.entrypoint_url_fallback}}
    return {{entrypoint}};
  })();
  flutterLoader.loadEntrypoint({
    entrypointUrl: entrypointUrl,
    onEntrypointLoaded: onEntrypointLoaded
  });
{{/if}}
})();

{{debug.patch_end}}
{{end_marker}}
"#;
