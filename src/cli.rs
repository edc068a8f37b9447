use clap::{Parser, Subcommand};
use shelf_insight_common::AnalysisMode;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "shelf-insight")]
#[command(about = "Retail shelf and ingredient label analysis with vision models", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログ（debug）
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// ログをJSONで出力
    #[arg(long, global = true)]
    pub json_logs: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// HTTP解析サーバーを起動
    Serve {
        /// バインドアドレス（デフォルトは設定値）
        #[arg(short, long)]
        bind: Option<String>,

        /// ポート（デフォルトは設定値またはPORT）
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// 商品棚写真または原材料表示を解析
    Analyze {
        /// 画像ファイルまたはフォルダ（フォルダ内は名前順）
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// 解析モード（shelf/ingredients）
        #[arg(short, long, default_value = "shelf")]
        mode: AnalysisMode,

        /// モデルID（デフォルトは設定値）
        #[arg(long)]
        model: Option<String>,

        /// 結果JSONの出力先
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 枠を描いた画像の出力フォルダ（shelfモードのみ）
        #[arg(short, long)]
        annotate: Option<PathBuf>,

        /// xlsxの出力先（ファイルまたはフォルダ）
        #[arg(short, long)]
        export: Option<PathBuf>,
    },

    /// 保存済み結果からxlsxを作成
    Export {
        /// 結果JSONファイル
        #[arg(required = true)]
        input: PathBuf,

        /// 結果を生成したモード
        #[arg(short, long, default_value = "shelf")]
        mode: AnalysisMode,

        /// 出力ファイルまたはフォルダ（デフォルト: 入力と同じ場所）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// shelf結果の商品枠を画像に描画
    Annotate {
        /// 画像ファイル
        #[arg(required = true)]
        image: PathBuf,

        /// shelf結果JSONファイル
        #[arg(required = true)]
        result: PathBuf,

        /// 出力PNG（デフォルト: <image>_annotated.png）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 既知のモデルID一覧
    Models,

    /// 設定の表示・編集
    Config {
        /// OpenRouter APIキーを保存
        #[arg(long)]
        set_api_key: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}
