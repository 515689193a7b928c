//! Templates for the scripts and pages shipped inside the package.
//!
//! Values reaching JavaScript are pre-quoted string literals (`js.*`);
//! values reaching HTML are pre-escaped (`html.*`); `ids.*` are raw element
//! ids for CSS selectors.

pub const POPUP_INIT_JS: &str = r#"// Chrome extension configuration for Flutter
{{debug.popup_config}}

(function() {
  const originalFetch = window.fetch;
  const isPackageAsset = function(url) {
    return url.includes('main.dart.') ||
      url.includes('canvaskit/') ||
      url.includes('skwasm') ||
      url.includes('.wasm') ||
      url.includes('.mjs');
  };
  window.fetch = function(url, options) {
    if (typeof url === 'string' && !url.startsWith('http') && !url.startsWith('chrome-extension://')) {
      if (isPackageAsset(url)) {
        url = chrome.runtime.getURL(url);
      }
    }
    return originalFetch.call(this, url, options);
  };

  const script = document.createElement('script');
  script.src = 'flutter_bootstrap.js';
  script.async = true;
  document.head.appendChild(script);
})();
"#;

pub const POPUP_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="UTF-8">
  <meta content="IE=Edge" http-equiv="X-UA-Compatible">
  <meta name="description" content="{{html.description}}">
  <title>{{html.name}}</title>

  <style>
    body {
      width: {{popup.width}}px;
      height: {{popup.height}}px;
      min-width: {{popup.width}}px;
      min-height: {{popup.height}}px;
      max-width: {{popup.width}}px;
      max-height: {{popup.height}}px;
      margin: 0;
      padding: 0;
      font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
      overflow: hidden;
      box-sizing: border-box;
    }

    #loading {
      display: flex;
      justify-content: center;
      align-items: center;
      width: {{popup.width}}px;
      height: {{popup.height}}px;
      color: #666;
      font-size: 14px;
      position: absolute;
      top: 0;
      left: 0;
    }

    #{{ids.container_id}} {
      width: {{popup.width}}px;
      height: {{popup.height}}px;
      min-width: {{popup.width}}px;
      min-height: {{popup.height}}px;
      max-width: {{popup.width}}px;
      max-height: {{popup.height}}px;
      display: block;
      position: absolute;
      top: 0;
      left: 0;
      box-sizing: border-box;
    }

    flt-glass-pane {
      width: {{popup.width}}px !important;
      height: {{popup.height}}px !important;
    }

    flt-scene-host {
      width: {{popup.width}}px !important;
      height: {{popup.height}}px !important;
    }
  </style>
</head>
<body>
  <div id="loading">Loading Flutter app...</div>
  <div id="{{ids.container_id}}"></div>

  <script src="flutter_init.js"></script>
</body>
</html>
"#;

pub const OVERLAY_INIT_JS: &str = r#"// Chrome content script configuration for Flutter
{{debug.content_config}}

(function() {
  let extensionId = window[{{js.extension_id_var}}] || '';
  try {
    extensionId = chrome.runtime.id || extensionId;
  } catch (e) {
    const scripts = document.querySelectorAll('script[src*="chrome-extension://"]');
    if (!extensionId && scripts.length > 0) {
      const match = scripts[0].src.match(/chrome-extension:\/\/([^/]+)/);
      if (match) extensionId = match[1];
    }
  }

  const isRelative = function(url) {
    return !url.startsWith('http') &&
      !url.startsWith('chrome-extension://') &&
      !url.startsWith('data:') &&
      !url.startsWith('blob:');
  };

  const originalBaseURI = document.baseURI;
  Object.defineProperty(document, 'baseURI', {
    get: function() {
      return extensionId ? 'chrome-extension://' + extensionId + '/' : originalBaseURI;
    },
    configurable: true
  });

  const originalFetch = window.fetch;
  window.fetch = function(url, options) {
    {{debug.content_fetch_intercepted}}
    if (typeof url === 'string' && extensionId && isRelative(url)) {
      const newUrl = 'chrome-extension://' + extensionId + '/' + url.replace(/^\/+/, '');
      {{debug.content_fetch_redirected}}
      url = newUrl;
    }
    return originalFetch.call(this, url, options);
  };

  const originalImport = window.import;
  if (originalImport) {
    window.import = function(url) {
      {{debug.content_import_intercepted}}
      if (typeof url === 'string' && extensionId && isRelative(url)) {
        const newUrl = 'chrome-extension://' + extensionId + '/' + url.replace(/^\/+/, '');
        {{debug.content_import_redirected}}
        url = newUrl;
      }
      return originalImport.call(this, url);
    };
  }

  {{debug.content_ready}}
  {{debug.content_delegated}}
})();
"#;

pub const CONTENT_SCRIPT_JS: &str = r#"// Flutter extension overlay controller
{{debug.content_loaded}}

(function() {
  const OVERLAY_ID = {{js.overlay_id}};
  const HEADER_ID = {{js.header_id}};
  const CLOSE_ID = {{js.close_id}};
  const CONTAINER_ID = {{js.container_id}};
  const EXTENSION_ID_VAR = {{js.extension_id_var}};
  const INIT_FLAG = {{js.init_flag}};
  const TITLE = {{js.name}};

  let flutterOverlay = null;
  let isDragging = false;
  const dragOffset = { x: 0, y: 0 };

  function createFlutterOverlay() {
    if (flutterOverlay) return;
    {{debug.overlay_create}}

    flutterOverlay = document.createElement('div');
    flutterOverlay.id = OVERLAY_ID;
    flutterOverlay.className = 'hidden';

    const header = document.createElement('div');
    header.id = HEADER_ID;
    const title = document.createElement('span');
    title.textContent = TITLE;
    const close = document.createElement('button');
    close.id = CLOSE_ID;
    close.title = 'Close';
    close.textContent = '×';
    header.appendChild(title);
    header.appendChild(close);

    const container = document.createElement('div');
    container.id = CONTAINER_ID;

    flutterOverlay.appendChild(header);
    flutterOverlay.appendChild(container);
    document.body.appendChild(flutterOverlay);

    header.addEventListener('mousedown', startDrag);
    document.addEventListener('mousemove', drag);
    document.addEventListener('mouseup', endDrag);
    close.addEventListener('click', hideFlutterOverlay);

    {{debug.overlay_created}}
  }

  function showFlutterOverlay() {
    if (!flutterOverlay) createFlutterOverlay();
    flutterOverlay.classList.remove('hidden');
    {{debug.overlay_shown}}

    setTimeout(function() {
      {{debug.overlay_init}}
      initializeFlutter();
    }, {{timing.init_delay_ms}});
  }

  function hideFlutterOverlay() {
    if (flutterOverlay) {
      flutterOverlay.classList.add('hidden');
      {{debug.overlay_hidden}}
    }
  }

  function toggleFlutterOverlay() {
    if (!flutterOverlay || flutterOverlay.classList.contains('hidden')) {
      showFlutterOverlay();
    } else {
      hideFlutterOverlay();
    }
  }

  function startDrag(e) {
    if (e.target && e.target.id === CLOSE_ID) return;
    isDragging = true;
    const rect = flutterOverlay.getBoundingClientRect();
    dragOffset.x = e.clientX - rect.left;
    dragOffset.y = e.clientY - rect.top;
    e.preventDefault();
  }

  function drag(e) {
    if (!isDragging) return;
    const x = e.clientX - dragOffset.x;
    const y = e.clientY - dragOffset.y;
    const maxX = window.innerWidth - flutterOverlay.offsetWidth;
    const maxY = window.innerHeight - flutterOverlay.offsetHeight;
    flutterOverlay.style.left = Math.max(0, Math.min(x, maxX)) + 'px';
    flutterOverlay.style.top = Math.max(0, Math.min(y, maxY)) + 'px';
    flutterOverlay.style.right = 'auto';
  }

  function endDrag() {
    isDragging = false;
  }

  function packageUrl(extensionId, file) {
    return extensionId ? 'chrome-extension://' + extensionId + '/' + file : file;
  }

  function initializeFlutter() {
    {{debug.content_init}}

    if (window[INIT_FLAG]) {
      {{debug.content_skip}}
      return;
    }
    window[INIT_FLAG] = true;

    let extensionId = '';
    try {
      if (typeof chrome !== 'undefined' && chrome.runtime && chrome.runtime.id) {
        extensionId = chrome.runtime.id;
      }
    } catch (e) {
      const scripts = document.querySelectorAll('script[src*="chrome-extension://"]');
      if (scripts.length > 0) {
        const match = scripts[0].src.match(/chrome-extension:\/\/([^/]+)/);
        if (match) extensionId = match[1];
      }
    }

    if (extensionId) {
      window[EXTENSION_ID_VAR] = extensionId;
      {{debug.content_extension_id}}
    }

    const initScript = document.createElement('script');
    initScript.src = packageUrl(extensionId, 'flutter_init.js');
    initScript.async = false;

    initScript.onload = function() {
      {{debug.init_script_loaded}}

      const bootstrapScript = document.createElement('script');
      bootstrapScript.src = packageUrl(extensionId, 'flutter_bootstrap.js');
      bootstrapScript.async = false;
      bootstrapScript.onload = function() {
        {{debug.bootstrap_loaded}}
      };
      bootstrapScript.onerror = function() {
        {{debug.bootstrap_failed}}
      };
      document.head.appendChild(bootstrapScript);
    };

    initScript.onerror = function() {
      {{debug.init_script_failed}}
      window[INIT_FLAG] = false;
    };

    document.head.appendChild(initScript);
  }

  document.addEventListener('keydown', function(e) {
    if (e.ctrlKey && e.shiftKey && e.key === {{js.toggle_key}}) {
      e.preventDefault();
      toggleFlutterOverlay();
    }
  });

  setTimeout(showFlutterOverlay, {{timing.show_delay_ms}});
  {{debug.content_initialized}}
})();
"#;

pub const CONTENT_SCRIPT_CSS: &str = r#"/* Flutter extension overlay */
#{{ids.overlay_id}} {
  position: fixed;
  top: 20px;
  right: 20px;
  width: 400px;
  height: 500px;
  background: white;
  border: 1px solid #ccc;
  border-radius: 8px;
  box-shadow: 0 4px 12px rgba(0, 0, 0, 0.15);
  z-index: 10000;
  font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
  overflow: hidden;
  resize: both;
  min-width: 300px;
  min-height: 200px;
}

#{{ids.header_id}} {
  background: #f0f0f0;
  border-bottom: 1px solid #ccc;
  padding: 8px 12px;
  cursor: move;
  display: flex;
  justify-content: space-between;
  align-items: center;
  font-size: 14px;
  font-weight: 500;
  user-select: none;
}

#{{ids.close_id}} {
  background: #ff5f56;
  border: none;
  border-radius: 50%;
  width: 18px;
  height: 18px;
  cursor: pointer;
  font-size: 10px;
  color: white;
  display: flex;
  align-items: center;
  justify-content: center;
}

#{{ids.close_id}}:hover {
  background: #ff3b30;
}

#{{ids.container_id}} {
  width: 100%;
  height: calc(100% - 40px);
  position: relative;
}

#{{ids.overlay_id}}.hidden {
  display: none;
}

#{{ids.overlay_id}} * {
  box-sizing: border-box;
}

#{{ids.container_id}} flt-glass-pane,
#{{ids.container_id}} canvas {
  width: 100% !important;
  height: 100% !important;
}
"#;
